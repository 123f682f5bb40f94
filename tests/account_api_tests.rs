//! Registration, login, verification and profile endpoints

mod common;

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, Utc};
use common::{spawn_app, spawn_app_with, FailingMailer, RecordingMailer, PASSWORD};
use lifetracker::ServerConfig;
use serde_json::json;
use std::sync::Arc;

fn verifying_config() -> ServerConfig {
    let mut config = ServerConfig::for_tests();
    config.authentication.email_verification = true;
    config
}

#[tokio::test]
async fn register_then_login() {
    let app = spawn_app().await;
    let token = app.register("alice").await;

    let profile = app.get("/user", &token).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["name"], "alice");
    assert_eq!(profile.body["is_active"], true);
    assert!(profile.body.get("password_hash").is_none());

    let login = app
        .post("/login", None, json!({"name": "alice", "password": PASSWORD}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["success"], true);
    assert_ne!(login.body["token"].as_str().unwrap(), token);
}

#[tokio::test]
async fn wrong_password_is_rejected_without_a_session() {
    let app = spawn_app().await;
    app.register("alice").await;
    let sessions = app.count("SELECT COUNT(*) FROM sessions").await;

    for _ in 0..2 {
        let response = app
            .post("/login", None, json!({"name": "alice", "password": "Falsch999"}))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(response.body["detail"], "Incorrect name or password");
    }

    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, sessions);
}

#[tokio::test]
async fn register_validates_input() {
    let app = spawn_app().await;

    let weak = app
        .post(
            "/register",
            None,
            json!({"name": "alice", "email": "alice@example.com", "password": "password1"}),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.body["error"], "InvalidRequest");
    assert!(weak.body["detail"].as_str().unwrap().contains("uppercase"));

    let short_name = app
        .post(
            "/register",
            None,
            json!({"name": "al", "email": "al@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(short_name.status, StatusCode::BAD_REQUEST);

    app.register("alice").await;
    let duplicate = app
        .post(
            "/register",
            None,
            json!({"name": "alice", "email": "new@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn incomplete_bodies_are_json_validation_errors() {
    let app = spawn_app().await;

    let missing = app.post("/register", None, json!({"name": "alice"})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "InvalidRequest");
    assert!(missing.body["detail"].as_str().unwrap().contains("email"));

    let blank = app
        .post(
            "/register",
            None,
            json!({"name": "   ", "email": "b@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn padded_names_log_in_under_the_same_string() {
    let app = spawn_app().await;

    let registered = app
        .post(
            "/register",
            None,
            json!({"name": "alice ", "email": "alice@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.body["name"], "alice");

    let login = app
        .post("/login", None, json!({"name": "alice ", "password": PASSWORD}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["name"], "alice");
}

#[tokio::test]
async fn missing_and_unknown_tokens_are_unauthorized() {
    let app = spawn_app().await;

    let missing = app.request(Method::GET, "/categories/", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.headers[header::WWW_AUTHENTICATE], "Bearer");

    let unknown = app.get("/categories/", "not-a-token").await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["error"], "Unauthenticated");
}

#[tokio::test]
async fn expired_session_is_unauthorized() {
    let app = spawn_app().await;
    let token = app.register("alice").await;

    sqlx::query("UPDATE sessions SET expires_at = ?1 WHERE token = ?2")
        .bind(Utc::now() - Duration::seconds(1))
        .bind(&token)
        .execute(&app.ctx.db)
        .await
        .unwrap();

    let response = app.get("/user", &token).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "SessionExpired");
}

#[tokio::test]
async fn logout_revokes_only_that_session() {
    let app = spawn_app().await;
    let first = app.register("alice").await;
    let second = app
        .post("/login", None, json!({"name": "alice", "password": PASSWORD}))
        .await
        .body["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app.post("/logout", Some(&first), json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "logged_out");

    assert_eq!(app.get("/user", &first).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/user", &second).await.status, StatusCode::OK);
}

#[tokio::test]
async fn profile_update_and_delete() {
    let app = spawn_app().await;
    let token = app.register("alice").await;
    app.register("bob").await;

    let taken = app
        .request(Method::PUT, "/user", Some(&token), Some(json!({"email": "bob@example.com"})))
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    let updated = app
        .request(Method::PUT, "/user", Some(&token), Some(json!({"name": "alice2"})))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "alice2");

    let deleted = app.request(Method::DELETE, "/user", Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["status"], "deleted");

    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 1);
    assert_eq!(app.count("SELECT COUNT(*) FROM categories").await, 4);
    assert_eq!(app.get("/user", &token).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn double_opt_in_over_http() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = spawn_app_with(verifying_config(), mailer.clone()).await;

    let registered = app
        .post(
            "/register",
            None,
            json!({"name": "alice", "email": "alice@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(registered.status, StatusCode::OK);
    assert!(registered.body["token"].is_null());
    assert!(registered.body["message"].is_string());

    let inactive = app
        .post("/login", None, json!({"name": "alice", "password": PASSWORD}))
        .await;
    assert_eq!(inactive.status, StatusCode::UNAUTHORIZED);
    assert_eq!(inactive.body["error"], "AccountInactive");

    let pending = app
        .post(
            "/register",
            None,
            json!({"name": "alice", "email": "alice@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(pending.status, StatusCode::CONFLICT);

    let code = mailer.last_code().unwrap();
    let bad_code = if code == "000000" { "999999" } else { "000000" };
    let wrong = app
        .post("/verify", None, json!({"email": "alice@example.com", "code": bad_code}))
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.body["error"], "InvalidCode");

    let verified = app
        .post("/verify", None, json!({"email": "alice@example.com", "code": code}))
        .await;
    assert_eq!(verified.status, StatusCode::OK);

    let login = app
        .post("/login", None, json!({"name": "alice", "password": PASSWORD}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.body["token"].is_string());
}

#[tokio::test]
async fn mail_failure_frees_the_name_again() {
    let app = spawn_app_with(verifying_config(), Arc::new(FailingMailer)).await;
    let body = json!({"name": "alice", "email": "alice@example.com", "password": PASSWORD});

    let first = app.post("/register", None, body.clone()).await;
    assert_eq!(first.status, StatusCode::BAD_GATEWAY);
    assert_eq!(first.body["error"], "MailDeliveryFailed");
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 0);

    // Not blocked by a pending registration
    let second = app.post("/register", None, body).await;
    assert_eq!(second.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn health_reports_database() {
    let app = spawn_app().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"]["status"], "healthy");

    let missing = app.request(Method::GET, "/nope", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
