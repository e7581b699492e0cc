use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, warn};

use crate::{proxy::forward_to_backend, AppState};

/// Liveness plus backend reachability. Does not require credentials.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let config = &state.config;

    let version = match state.backend.version(config.health_timeout).await {
        Ok(v) => v.version,
        Err(e) => {
            warn!("Health check could not reach backend: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "backend": "unreachable",
                    "backend_url": state.backend.base_url(),
                    "error": e.to_string(),
                    "timestamp": Utc::now().to_rfc3339(),
                })),
            )
                .into_response();
        }
    };

    let model_loaded = state
        .backend
        .running_models(config.health_timeout)
        .await
        .map(|ps| ps.contains(&config.model_name))
        .unwrap_or(false);

    Json(json!({
        "status": "ok",
        "backend": "reachable",
        "backend_url": state.backend.base_url(),
        "backend_version": version,
        "model": config.model_name,
        "model_loaded": model_loaded,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

pub async fn proxy_request(State(state): State<AppState>, request: Request) -> Response {
    match forward_to_backend(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Proxy error: {}", e);
            e.into_response()
        }
    }
}
