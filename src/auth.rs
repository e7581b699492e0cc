use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::{config::AppConfig, error::AppError};

/// Rejects the request with 401 unless it carries `Authorization: Bearer <token>`.
pub async fn require_bearer(
    State(config): State<Arc<AppConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if !is_authorized(req.headers(), &config.expected_authorization()) {
        warn!(path = %req.uri().path(), "Rejected request with missing or invalid credentials");
        return AppError::Unauthorized.into_response();
    }
    next.run(req).await
}

pub fn is_authorized(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map_or(false, |value| constant_time_eq(value.as_bytes(), expected.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
