/// Background task implementations
use crate::{context::AppContext, error::TrackerResult};

/// Sweep counts from a single run of every task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_sessions: u64,
    pub unverified_users: u64,
    /// Sweeps that returned an error
    pub failed: usize,
}

/// Cleanup expired sessions
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> TrackerResult<u64> {
    ctx.account_manager.cleanup_expired_sessions().await
}

/// Purge accounts that never completed email verification within the grace window
pub async fn purge_unverified_users(ctx: &AppContext) -> TrackerResult<u64> {
    ctx.account_manager.purge_unverified_users().await
}

/// Run every sweep once. A failing sweep is logged and does not stop the others.
pub async fn run_all(ctx: &AppContext) -> SweepReport {
    let mut report = SweepReport::default();

    match cleanup_expired_sessions(ctx).await {
        Ok(count) => report.expired_sessions = count,
        Err(e) => {
            tracing::error!("Failed to cleanup expired sessions: {}", e);
            report.failed += 1;
        }
    }

    match purge_unverified_users(ctx).await {
        Ok(count) => report.unverified_users = count,
        Err(e) => {
            tracing::error!("Failed to purge unverified users: {}", e);
            report.failed += 1;
        }
    }

    tracing::info!(
        expired_sessions = report.expired_sessions,
        unverified_users = report.unverified_users,
        failed = report.failed,
        "Cleanup sweep finished"
    );

    report
}
