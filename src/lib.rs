//! Authenticating reverse proxy for a local Ollama server.
//!
//! Every `/api/*` route requires `Authorization: Bearer <API_TOKEN>`.
//! Generate and chat bodies get default inference options merged under the
//! caller's own, and are forced to non-streaming unless the caller asks
//! for `"stream": true`. A background task warms the configured model at
//! startup and keeps it resident.

pub mod augment;
pub mod auth;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod options;
pub mod proxy;
pub mod telemetry;
pub mod warmup;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, head, post},
    Router,
};
use std::sync::Arc;

use crate::{backend::BackendClient, config::AppConfig};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: BackendClient,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, backend: BackendClient) -> Self {
        Self { config, backend }
    }
}

pub fn build_router(state: AppState) -> Router {
    let proxy = handlers::proxy_request;

    let api = Router::new()
        .route("/api/version", get(proxy))
        .route("/api/tags", get(proxy))
        .route("/api/ps", get(proxy))
        .route("/api/generate", post(proxy))
        .route("/api/chat", post(proxy))
        .route("/api/create", post(proxy))
        .route("/api/pull", post(proxy))
        .route("/api/push", post(proxy))
        .route("/api/embed", post(proxy))
        .route("/api/embeddings", post(proxy))
        .route("/api/show", post(proxy))
        .route("/api/copy", post(proxy))
        .route("/api/delete", delete(proxy))
        .route("/api/blobs/:digest", head(proxy).post(proxy))
        .route_layer(from_fn_with_state(
            state.config.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(api)
        .layer(from_fn(telemetry::request_logging_middleware))
        .with_state(state)
}
