use axum::{
    body::Body,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, Response,
    },
};
use futures_util::TryStreamExt;
use tracing::{debug, error, warn};

use crate::error::AppError;

const NDJSON: &str = "application/x-ndjson";
const JSON: &str = "application/json";

/// Turns the backend reply into the client reply. Successful streaming
/// replies are piped chunk by chunk; everything else is buffered.
pub async fn relay_response(
    response: reqwest::Response,
    stream: bool,
) -> Result<Response<Body>, AppError> {
    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();

    if !status.is_success() {
        warn!(status = status.as_u16(), "Backend returned an error status");
    }

    let builder = Response::builder().status(status);

    if stream && status.is_success() {
        debug!("Relaying streaming response");
        let chunks = response.bytes_stream().inspect_err(|e| {
            error!("Backend stream error: {}", e);
        });

        return Ok(builder
            .header(
                CONTENT_TYPE,
                content_type.unwrap_or_else(|| HeaderValue::from_static(NDJSON)),
            )
            .header(CACHE_CONTROL, "no-cache")
            .header("x-accel-buffering", "no")
            .body(Body::from_stream(chunks))?);
    }

    let body = response.bytes().await.map_err(AppError::Backend)?;
    Ok(builder
        .header(
            CONTENT_TYPE,
            content_type.unwrap_or_else(|| HeaderValue::from_static(JSON)),
        )
        .body(Body::from(body))?)
}
