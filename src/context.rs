use axum::http::{request::Parts, Method};

const GENERATION_MARKERS: [&str; 2] = ["/generate", "/chat"];
const BLOB_PREFIX: &str = "/api/blobs/";
const PROGRESS_ROUTES: [&str; 3] = ["/api/pull", "/api/push", "/api/create"];

/// The parts of an inbound request the proxy routes on.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

impl RequestEnvelope {
    pub fn new(method: Method, path: impl Into<String>, query: Option<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(
            parts.method.clone(),
            parts.uri.path(),
            parts.uri.query().map(str::to_string),
        )
    }

    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// GET and HEAD never forward a body.
    pub fn carries_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::HEAD
    }

    /// POSTs to generate/chat endpoints get default options injected.
    pub fn is_generation(&self) -> bool {
        self.method == Method::POST && GENERATION_MARKERS.iter().any(|m| self.path.contains(m))
    }

    /// Pull, push and create report progress as a stream unless the body
    /// says otherwise.
    pub fn streams_by_default(&self) -> bool {
        self.method == Method::POST && PROGRESS_ROUTES.contains(&self.path.as_str())
    }

    /// Blob uploads are binary and are streamed through untouched.
    pub fn is_blob_upload(&self) -> bool {
        self.method == Method::POST && self.path.starts_with(BLOB_PREFIX)
    }
}
