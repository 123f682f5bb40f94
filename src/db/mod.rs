/// Database layer for Lifetracker
///
/// Manages the connection pool and migrations and exposes the row types
/// shared by the account, schema and entry stores.

pub mod models;

use crate::error::{TrackerError, TrackerResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Create a SQLite connection pool from a `sqlite:` connection string
pub async fn create_pool(url: &str, options: DatabaseOptions) -> TrackerResult<SqlitePool> {
    if !url.starts_with("sqlite:") {
        return Err(TrackerError::Validation(
            "Only sqlite: connection strings are supported".to_string(),
        ));
    }

    let in_memory = is_in_memory(url);

    let mut connect_options = SqliteConnectOptions::from_str(url)
        .map_err(|e| TrackerError::Validation(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(5));

    if in_memory {
        // Every connection to :memory: is its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;
        return Ok(pool);
    }

    // Ensure parent directory exists
    if let Some(parent) = connect_options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    connect_options = connect_options.journal_mode(if options.enable_wal {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    });

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(connect_options)
        .await?;

    Ok(pool)
}

/// Run migrations for a database
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> TrackerResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> TrackerResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// In-memory pool with the schema applied, used by tests across the crate
pub async fn connect_in_memory() -> TrackerResult<SqlitePool> {
    let pool = create_pool("sqlite::memory:", DatabaseOptions::default()).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
