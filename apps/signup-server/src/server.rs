use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, response::Json, routing::get, Router};
use registration::Registration;
use runtime::ServerConfig;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::request_id;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Build the HTTP router: module routes, `/health`, then the middleware stack.
pub fn build_router(module: &Registration, cfg: &ServerConfig) -> Router {
    let mut router = module.register_rest(Router::new().route("/health", get(health_check)));

    // Layers wrap what is already there, so they are added innermost first.
    // Effective order (outermost to innermost):
    // SetRequestId -> PropagateRequestId -> Trace -> push_req_id_to_extensions -> Timeout -> BodyLimit
    let x_request_id = request_id::header();

    router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));

    if cfg.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(cfg.timeout_sec)));
    }

    router = router.layer(from_fn(request_id::push_req_id_to_extensions));
    router = router.layer(request_id::create_trace_layer());
    router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
    router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

    router
}

pub async fn bind(cfg: &ServerConfig) -> Result<TcpListener> {
    let listener = TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", cfg.host, cfg.port))?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Resolves on the first termination signal.
pub async fn shutdown_signal() {
    match runtime::shutdown::wait_for_shutdown().await {
        Ok(()) => tracing::info!("HTTP server shutting down gracefully"),
        Err(e) => {
            // Without signal handlers the process can only be killed.
            tracing::error!(error = %e, "Failed to install signal handlers");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use registration::config::RegistrationConfig;
    use sea_orm::Database;
    use tower::ServiceExt;

    async fn test_router(cfg: &ServerConfig) -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let module = Registration::new(
            db,
            RegistrationConfig {
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
            },
        )
        .unwrap();
        module.migrate().await.unwrap();
        build_router(&module, cfg)
    }

    fn register_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/register")
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = test_router(&ServerConfig::default()).await;

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_register_through_middleware_stack() {
        let router = test_router(&ServerConfig::default()).await;

        let response = router
            .oneshot(register_request(r#"{"email":"a@x.com","password":"p1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let rid = response.headers().get("x-request-id").unwrap();
        assert!(!rid.is_empty());
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_echoed() {
        let router = test_router(&ServerConfig::default()).await;

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let rid = response.headers().get("x-request-id").unwrap();
        assert_eq!(rid.to_str().unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn test_body_limit_rejects_large_payloads() {
        let cfg = ServerConfig {
            body_limit_bytes: 64,
            ..Default::default()
        };
        let router = test_router(&cfg).await;
        let big = format!(r#"{{"email":"a@x.com","password":"{}"}}"#, "x".repeat(256));

        let req = Request::builder()
            .method("POST")
            .uri("/register")
            .header("content-type", "application/json")
            .header("content-length", big.len())
            .body(Body::from(big))
            .unwrap();

        let response = router.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let router = test_router(&ServerConfig::default()).await;

        let response = router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let cfg = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            ..Default::default()
        };
        let router = test_router(&cfg).await;
        let listener = bind(&cfg).await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, router, async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
