/// API routes and handlers
pub mod auth;
pub mod categories;
pub mod entries;
pub mod extract;
pub mod health;
pub mod legacy;
pub mod middleware;
pub mod users;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(categories::routes())
        .merge(entries::routes())
        .merge(legacy::routes())
}
