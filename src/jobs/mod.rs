use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!(
            session_sweep_secs = self.context.config.jobs.session_sweep_secs,
            registration_sweep_secs = self.context.config.jobs.registration_sweep_secs,
            "Starting background job scheduler"
        );

        tokio::spawn(Self::expired_session_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::unverified_user_purge_job(Arc::clone(&self)));
    }

    /// Delete sessions past their expiry
    async fn expired_session_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(
            scheduler.context.config.jobs.session_sweep_secs,
        ));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match tasks::cleanup_expired_sessions(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!(count, "Cleaned up expired sessions");
                    }
                }
                Err(e) => error!("Failed to cleanup expired sessions: {}", e),
            }
        }
    }

    /// Delete registrations that were never confirmed
    async fn unverified_user_purge_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(
            scheduler.context.config.jobs.registration_sweep_secs,
        ));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match tasks::purge_unverified_users(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!(count, "Purged unverified registrations");
                    }
                }
                Err(e) => error!("Failed to purge unverified registrations: {}", e),
            }
        }
    }
}
