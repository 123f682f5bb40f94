/// Application context and dependency injection
use crate::{
    account::AccountManager,
    config::ServerConfig,
    db,
    entries::EntryStore,
    error::TrackerResult,
    mailer::{Mailer, VerificationMailer},
    schema::CategoryRegistry,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub category_registry: Arc<CategoryRegistry>,
    pub entry_store: Arc<EntryStore>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> TrackerResult<Self> {
        config.validate()?;

        let db = db::create_pool(
            &config.storage.database_url,
            db::DatabaseOptions {
                max_connections: config.storage.max_connections,
                ..Default::default()
            },
        )
        .await?;

        db::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        let mailer = Arc::new(Mailer::new(config.email.clone())?);
        if !mailer.is_configured() {
            tracing::info!("SMTP not configured, outbound mail disabled");
        }

        Ok(Self::with_pool(config, db, mailer))
    }

    /// Assemble the services around an existing pool and mailer
    pub fn with_pool(config: ServerConfig, db: SqlitePool, mailer: Arc<dyn VerificationMailer>) -> Self {
        let config = Arc::new(config);
        let account_manager = Arc::new(AccountManager::new(db.clone(), config.clone(), mailer));
        let category_registry = Arc::new(CategoryRegistry::new(db.clone()));
        let entry_store = Arc::new(EntryStore::new(db.clone()));

        Self {
            config,
            db,
            account_manager,
            category_registry,
            entry_store,
        }
    }
}
