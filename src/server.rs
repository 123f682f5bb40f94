/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{TrackerError, TrackerResult},
};
use axum::{
    http::{header, Method, StatusCode},
    response::Json,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(crate::api::routes())
        .fallback(not_found)
        .with_state(ctx)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "detail": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> TrackerResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!(
        version = %ctx.config.service.version,
        email_verification = ctx.config.authentication.email_verification,
        "Lifetracker listening on {}",
        addr
    );

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TrackerError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TrackerError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
