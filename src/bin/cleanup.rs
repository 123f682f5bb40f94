/// One-shot cleanup sweep for cron: expired sessions and stale registrations.
///
/// Exits non-zero only when configuration or the database connection fails;
/// a failing sweep is logged and the other one still runs.
use anyhow::Context;
use lifetracker::{jobs::tasks, logging, AppContext, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("failed to load configuration")?;
    logging::init(&config.logging.level);

    let ctx = AppContext::new(config)
        .await
        .context("failed to open the database")?;

    tasks::run_all(&ctx).await;

    Ok(())
}
