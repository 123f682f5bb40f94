//! Shared helpers for router-level tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use lifetracker::{
    db::connect_in_memory, mailer::VerificationMailer, server::build_router, AppContext,
    ServerConfig, TrackerError, TrackerResult,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const PASSWORD: &str = "Passwort1";

/// Mailer that remembers every code it was asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl VerificationMailer for RecordingMailer {
    async fn send_verification_code(&self, to_email: &str, _name: &str, code: &str) -> TrackerResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), code.to_string()));
        Ok(())
    }
}

/// Mailer whose SMTP server is always down
pub struct FailingMailer;

#[async_trait]
impl VerificationMailer for FailingMailer {
    async fn send_verification_code(&self, _: &str, _: &str, _: &str) -> TrackerResult<()> {
        Err(TrackerError::Mail("connection refused".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub ctx: AppContext,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(ServerConfig::for_tests(), Arc::new(RecordingMailer::default())).await
}

pub async fn spawn_app_with(config: ServerConfig, mailer: Arc<dyn VerificationMailer>) -> TestApp {
    let pool = connect_in_memory().await.expect("in-memory database");
    let ctx = AppContext::with_pool(config, pool, mailer);
    TestApp {
        router: build_router(ctx.clone()),
        ctx,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Register a user with verification disabled and return their token
    pub async fn register(&self, name: &str) -> String {
        let response = self
            .post(
                "/register",
                None,
                json!({
                    "name": name,
                    "email": format!("{}@example.com", name),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(&self.ctx.db).await.unwrap()
    }

    /// Id of the user's category with the given name
    pub async fn category_id(&self, token: &str, name: &str) -> i64 {
        let response = self.get("/categories/", token).await;
        response.body
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .and_then(|c| c["id"].as_i64())
            .unwrap_or_else(|| panic!("category {} not found", name))
    }
}
