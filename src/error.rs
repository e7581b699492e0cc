use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use serde_json::json;
use std::error::Error as StdError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing or invalid bearer token")]
    Unauthorized,

    #[error("Backend at {backend_url} is unreachable")]
    BackendUnavailable { backend_url: String },

    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Request to backend failed: {0}")]
    Backend(reqwest::Error),

    #[error("Axum error: {0}")]
    AxumError(#[from] axum::Error),

    #[error("Failed to build response: {0}")]
    Http(#[from] http::Error),
}

impl AppError {
    /// Classifies a transport failure talking to the backend. Refused or
    /// unreachable connections become 503, everything else is a 500.
    pub fn from_backend(err: reqwest::Error, backend_url: &str) -> Self {
        if err.is_connect() {
            AppError::BackendUnavailable {
                backend_url: backend_url.to_string(),
            }
        } else {
            AppError::Backend(err)
        }
    }

    /// Classifies a failure reading the inbound body against `limit`.
    pub fn from_body(err: axum::Error, limit: usize) -> Self {
        let mut cause: Option<&(dyn StdError + 'static)> = Some(&err);
        while let Some(e) = cause {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                return AppError::PayloadTooLarge { limit };
            }
            cause = e.source();
        }
        AppError::AxumError(err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidBody(_) | AppError::NotAnObject => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Backend(_) | AppError::AxumError(_) | AppError::Http(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "authentication_error",
            AppError::BackendUnavailable { .. } => "service_unavailable",
            AppError::InvalidBody(_) | AppError::NotAnObject => "invalid_request",
            AppError::PayloadTooLarge { .. } => "payload_too_large",
            AppError::Backend(_) | AppError::AxumError(_) | AppError::Http(_) => "internal_error",
        }
    }
}

/// Renders an error followed by each of its causes, `outer: inner: root`.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        let text = e.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        cause = e.source();
    }
    message
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::BackendUnavailable { backend_url } => format!(
                "Inference backend is unavailable. Make sure it is running at {}",
                backend_url
            ),
            AppError::Backend(e) => format!("Proxy request failed: {}", error_chain(e)),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": self.kind(),
            }
        }));

        (self.status(), body).into_response()
    }
}
