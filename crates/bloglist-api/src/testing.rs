//! Shared fixtures for the in-process HTTP tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use bloglist_db::Database;

use crate::auth::{AppState, AppStateInner};
use crate::password::PasswordHasher;
use crate::tokens::TokenService;

pub fn state() -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        tokens: TokenService::new("test-secret"),
        // Minimum Argon2 cost keeps the suite fast
        hasher: PasswordHasher::with_cost(8, 1, 1).unwrap(),
    })
}

pub fn app(state: AppState) -> Router {
    crate::routes::router(state, None)
}

pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

/// Drive one request through the router. Empty bodies come back as `Null`.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub async fn register(app: &Router, username: &str, password: &str) -> Uuid {
    let body = json!({"username": username, "name": "Root User", "password": password});
    let (status, body) = send(app, json_request(Method::POST, "/api/users", body, None)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["id"].as_str().unwrap().parse().unwrap()
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let body = json!({"username": username, "password": password});
    let (status, body) = send(app, json_request(Method::POST, "/api/login", body, None)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}
