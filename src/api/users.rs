/// Profile endpoints for the authenticated user
use crate::{
    account::{UserOut, UserUpdate},
    auth::AuthUser,
    context::AppContext,
    error::TrackerResult,
};
use super::extract::Json;
use axum::{extract::State, routing::get, Router};
use serde_json::{json, Value};

pub fn routes() -> Router<AppContext> {
    Router::new().route("/user", get(get_user).put(update_user).delete(delete_user))
}

async fn get_user(auth: AuthUser) -> Json<UserOut> {
    Json(UserOut::from(&auth.user))
}

async fn update_user(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(update): Json<UserUpdate>,
) -> TrackerResult<Json<UserOut>> {
    let user = ctx.account_manager.update_user(auth.id(), update).await?;
    Ok(Json(UserOut::from(&user)))
}

async fn delete_user(State(ctx): State<AppContext>, auth: AuthUser) -> TrackerResult<Json<Value>> {
    ctx.account_manager.delete_user(auth.id()).await?;
    Ok(Json(json!({ "status": "deleted", "id": auth.id() })))
}
