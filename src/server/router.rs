use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::objects::serve_object;
use super::repos::repos_router;
use super::webhook::webhook_router;
use crate::github::SourceHost;
use crate::storage::ObjectStore;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub source: Arc<dyn SourceHost>,
    pub objects: Arc<dyn ObjectStore>,
    /// Shared secret for Docora webhook signatures.
    pub webhook_secret: String,
    /// Expected application identifier header; None accepts any.
    pub webhook_app_id: Option<String>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", repos_router())
        .nest("/webhooks/docora", webhook_router())
        .route("/objects/{*key}", get(serve_object))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
