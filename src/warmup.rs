//! Startup warmup and periodic keepalive for the configured model.
//!
//! Warmup runs once: version check, model lookup, then a short generation
//! that forces the model into backend memory. When it succeeds a keepalive
//! task pings the model on a fixed interval so the backend does not unload
//! it. Neither path can stop the HTTP server; failures are only logged.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{
    task::JoinHandle,
    time::{interval_at, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    backend::{BackendClient, BackendError, GenerateRequest},
    config::AppConfig,
    options::InferenceOptions,
};

const WARMUP_PROMPT: &str = "Hello";
const WARMUP_MAX_TOKENS: u32 = 10;
const KEEPALIVE_PROMPT: &str = "ping";
const KEEPALIVE_MAX_TOKENS: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum WarmupError {
    #[error("backend liveness check failed: {0}")]
    Liveness(#[source] BackendError),

    #[error("could not list backend models: {0}")]
    Listing(#[source] BackendError),

    #[error("model {model} is not installed on the backend")]
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },

    #[error("warmup generation failed: {0}")]
    Generation(#[source] BackendError),
}

#[derive(Debug, Clone)]
pub struct WarmupReport {
    pub backend_version: String,
    pub elapsed: Duration,
    pub response: String,
}

/// Verifies the backend and loads the model with one throwaway generation.
pub async fn warm_up(
    backend: &BackendClient,
    config: &AppConfig,
) -> Result<WarmupReport, WarmupError> {
    let model = config.model_name.as_str();

    let version = backend
        .version(config.health_timeout)
        .await
        .map_err(WarmupError::Liveness)?;
    info!(version = %version.version, url = backend.base_url(), "Backend is reachable");

    let installed = backend
        .tags(config.health_timeout)
        .await
        .map_err(WarmupError::Listing)?;
    if !installed.contains(model) {
        return Err(WarmupError::ModelNotFound {
            model: model.to_string(),
            available: installed.names().into_iter().map(str::to_string).collect(),
        });
    }
    debug!(model, "Model is installed");

    info!(model, "Loading model into backend memory");
    let start = Instant::now();
    let request = GenerateRequest {
        model,
        prompt: WARMUP_PROMPT,
        stream: false,
        options: InferenceOptions::default().with_num_predict(WARMUP_MAX_TOKENS),
    };
    let reply = backend
        .generate(&request, config.warmup_timeout)
        .await
        .map_err(WarmupError::Generation)?;

    Ok(WarmupReport {
        backend_version: version.version,
        elapsed: start.elapsed(),
        response: reply.response.trim().to_string(),
    })
}

/// One keepalive ping: a single-token generation with a short timeout.
pub async fn keepalive_tick(backend: &BackendClient, config: &AppConfig) -> Result<(), BackendError> {
    let request = GenerateRequest {
        model: &config.model_name,
        prompt: KEEPALIVE_PROMPT,
        stream: false,
        options: InferenceOptions::default().with_num_predict(KEEPALIVE_MAX_TOKENS),
    };
    backend
        .generate(&request, config.keepalive_timeout)
        .await
        .map(|_| ())
}

/// Pings the model every `keepalive_interval` until `cancel` fires. A failed
/// ping is logged and the loop carries on.
pub fn spawn_keepalive(
    backend: BackendClient,
    config: Arc<AppConfig>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = config.keepalive_interval;
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            model = %config.model_name,
            interval_secs = period.as_secs(),
            "Keepalive started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Keepalive cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    match keepalive_tick(&backend, &config).await {
                        Ok(()) => debug!(model = %config.model_name, "Keepalive ping succeeded"),
                        Err(e) => warn!(model = %config.model_name, "Keepalive ping failed: {}", e),
                    }
                }
            }
        }
    })
}

/// Warmup followed by keepalive. Returns the keepalive handle, or `None` when
/// warmup failed and the process keeps serving without a preloaded model.
pub async fn start(
    backend: BackendClient,
    config: Arc<AppConfig>,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    match warm_up(&backend, &config).await {
        Ok(report) => {
            info!(
                model = %config.model_name,
                backend_version = %report.backend_version,
                elapsed_ms = report.elapsed.as_millis() as u64,
                response = %report.response,
                "Model warmed up"
            );
            Some(spawn_keepalive(backend, config, cancel))
        }
        Err(WarmupError::ModelNotFound { model, available }) => {
            warn!(
                model = %model,
                available = ?available,
                "Model not found on backend, skipping warmup. Pull it with `ollama pull {}`",
                model
            );
            None
        }
        Err(e) => {
            error!("Warmup failed, serving without a preloaded model: {}", e);
            None
        }
    }
}
