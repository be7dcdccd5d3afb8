#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sea_orm::{Database, DatabaseConnection};
use tower::ServiceExt;

use registration::config::RegistrationConfig;
use registration::Registration;

/// Argon2 parameters small enough to keep tests fast.
pub fn cheap_config() -> RegistrationConfig {
    RegistrationConfig {
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    }
}

/// Fresh in-memory database with migrations applied.
pub async fn create_test_module() -> (Registration, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    let module = Registration::new(db.clone(), cheap_config()).expect("module init");
    module.migrate().await.expect("Failed to run migrations");

    (module, db)
}

pub async fn create_test_router() -> (Router, Registration) {
    let (module, _db) = create_test_module().await;
    (module.register_rest(Router::new()), module)
}

pub fn json_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

pub async fn post_json(router: &Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    send(router, json_request(body.to_string())).await
}
