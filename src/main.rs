/// Lifetracker server binary
use lifetracker::{jobs, logging, server, AppContext, ServerConfig, TrackerResult};
use std::sync::Arc;

#[tokio::main]
async fn main() -> TrackerResult<()> {
    let config = ServerConfig::from_env()?;
    logging::init(&config.logging.level);

    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    server::serve((*ctx).clone()).await?;

    Ok(())
}
