//! Client for the inference backend. The proxy path uses the raw
//! `reqwest::Client`; warmup and health use the typed calls below.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{config::AppConfig, options::InferenceOptions};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend at {0} is unreachable")]
    Unreachable(String),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
}

/// Shape shared by `/api/tags` (installed) and `/api/ps` (loaded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl ModelList {
    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| model_matches(&m.name, model))
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: InferenceOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// A backend entry matches on the exact name or on `<name>:<tag>`.
pub fn model_matches(candidate: &str, model: &str) -> bool {
    candidate == model
        || candidate
            .strip_prefix(model)
            .map_or(false, |rest| rest.starts_with(':'))
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.request_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            base_url: config.backend_url.clone(),
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    pub async fn version(&self, timeout: Duration) -> Result<VersionResponse, BackendError> {
        self.get_json("/api/version", timeout).await
    }

    /// Installed models.
    pub async fn tags(&self, timeout: Duration) -> Result<ModelList, BackendError> {
        self.get_json("/api/tags", timeout).await
    }

    /// Models currently resident in memory.
    pub async fn running_models(&self, timeout: Duration) -> Result<ModelList, BackendError> {
        self.get_json("/api/ps", timeout).await
    }

    pub async fn generate(
        &self,
        request: &GenerateRequest<'_>,
        timeout: Duration,
    ) -> Result<GenerateResponse, BackendError> {
        debug!(model = request.model, "Sending generate request to backend");
        let response = self
            .http
            .post(self.url("/api/generate"))
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        Self::decode(response).await
    }

    async fn get_json<T>(&self, path: &str, timeout: Duration) -> Result<T, BackendError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(self.url(path))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        Self::decode(response).await
    }

    async fn decode<T>(response: reqwest::Response) -> Result<T, BackendError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(response.json::<T>().await?)
    }

    fn classify(&self, err: reqwest::Error) -> BackendError {
        if err.is_connect() {
            BackendError::Unreachable(self.base_url.clone())
        } else {
            BackendError::Request(err)
        }
    }
}
