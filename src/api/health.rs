/// Health check endpoints
///
/// `/health/live` only proves the process answers; `/health` also pings the
/// database and reports 503 when it cannot.
use crate::{context::AppContext, db};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use std::time::Instant;

/// Health status response
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub database: ComponentHealth,
}

/// Health of a single dependency
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(liveness))
}

async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let started = Instant::now();
    let result = db::test_connection(&ctx.db).await;
    let response_time_ms = started.elapsed().as_millis() as u64;

    let database = match result {
        Ok(()) => ComponentHealth {
            status: "healthy",
            response_time_ms,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            ComponentHealth {
                status: "unhealthy",
                response_time_ms,
                error: Some("database unreachable".to_string()),
            }
        }
    };

    let (code, status) = if database.error.is_none() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        code,
        Json(HealthStatus {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
