use axum::{routing::post, Extension, Router};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the registration endpoints on `router`.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    // POST /register - Create a new account
    let routes = Router::new()
        .route("/register", post(handlers::register))
        .layer(Extension(service));

    router.merge(routes)
}
