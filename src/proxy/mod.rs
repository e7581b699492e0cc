use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderValue, Response},
};
use tracing::{debug, info};

use crate::{
    augment::{prepare_body, PreparedBody},
    context::RequestEnvelope,
    error::AppError,
    AppState,
};

mod response;

pub use response::relay_response;

/// Forwards one request to the backend. Single attempt, no retries.
pub async fn forward_to_backend(
    state: &AppState,
    request: Request,
) -> Result<Response<Body>, AppError> {
    let (parts, body) = request.into_parts();
    let envelope = RequestEnvelope::from_parts(&parts);
    let url = state.backend.url(&envelope.path_and_query());

    let mut outbound = state
        .backend
        .http()
        .request(envelope.method.clone(), &url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let stream = if envelope.is_blob_upload() {
        debug!(path = %envelope.path, "Streaming blob upload to backend");
        outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        false
    } else {
        // Blob uploads bypass the limit.
        let limit = state.config.max_body_bytes;
        let raw = to_bytes(body, limit)
            .await
            .map_err(|e| AppError::from_body(e, limit))?;
        let PreparedBody { bytes, stream } = prepare_body(&envelope, raw)?;
        if envelope.carries_body() {
            outbound = outbound.body(bytes);
        }
        stream
    };

    info!(
        method = %envelope.method,
        url = %url,
        stream,
        "Forwarding request to backend"
    );

    let response = outbound
        .send()
        .await
        .map_err(|e| AppError::from_backend(e, state.backend.base_url()))?;

    relay_response(response, stream).await
}
