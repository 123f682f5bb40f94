/// Registration, verification, login and logout endpoints
use crate::{
    account::{LoginRequest, LoginSuccess, RegisterRequest, VerifyOutcome, VerifyRequest},
    auth::AuthUser,
    context::AppContext,
    error::TrackerResult,
};
use super::extract::Json;
use axum::{extract::State, routing::post, Router};
use serde_json::{json, Value};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> TrackerResult<Json<LoginSuccess>> {
    let registration = ctx.account_manager.register(req).await?;

    let message = registration
        .session
        .is_none()
        .then(|| "Please check your email and enter the verification code.".to_string());

    Ok(Json(LoginSuccess {
        success: true,
        token: registration.session.map(|s| s.token),
        name: registration.user.name,
        message,
    }))
}

async fn verify(
    State(ctx): State<AppContext>,
    Json(req): Json<VerifyRequest>,
) -> TrackerResult<Json<Value>> {
    let message = match ctx.account_manager.verify(&req.email, &req.code).await? {
        VerifyOutcome::Activated => "Account activated, please continue with login.",
        VerifyOutcome::AlreadyActive => "Account is already active.",
    };

    Ok(Json(json!({ "message": message })))
}

async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> TrackerResult<Json<LoginSuccess>> {
    let (user, session) = ctx.account_manager.login(&req.name, &req.password).await?;

    tracing::debug!(user_id = user.id, "User logged in");

    Ok(Json(LoginSuccess {
        success: true,
        token: Some(session.token),
        name: user.name,
        message: None,
    }))
}

async fn logout(State(ctx): State<AppContext>, auth: AuthUser) -> TrackerResult<Json<Value>> {
    ctx.account_manager.logout(&auth.token).await?;
    Ok(Json(json!({ "status": "logged_out" })))
}
