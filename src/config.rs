use dotenv::dotenv;
use std::{env, str::FromStr, time::Duration};

use crate::telemetry::LogFormat;

const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "mistral:7b";
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_TOKEN must be set to a non-empty value")]
    MissingToken,

    #[error("{name} has an invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Process-wide settings. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub api_token: String,
    pub backend_url: String,
    pub model_name: String,
    pub request_timeout: Duration,
    pub warmup_timeout: Duration,
    pub health_timeout: Duration,
    pub keepalive_timeout: Duration,
    pub keepalive_interval: Duration,
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("API_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let backend_url = lookup("OLLAMA_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                name: "OLLAMA_URL",
                value: backend_url,
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            api_token,
            backend_url,
            model_name: lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout: secs_or(&lookup, "REQUEST_TIMEOUT_SECS", 300)?,
            warmup_timeout: secs_or(&lookup, "WARMUP_TIMEOUT_SECS", 120)?,
            health_timeout: secs_or(&lookup, "HEALTH_TIMEOUT_SECS", 5)?,
            keepalive_timeout: secs_or(&lookup, "KEEPALIVE_TIMEOUT_SECS", 30)?,
            keepalive_interval: secs_or(&lookup, "KEEPALIVE_INTERVAL_SECS", 600)?,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Compact)?,
        })
    }

    /// The exact `Authorization` header value a client must send.
    pub fn expected_authorization(&self) -> String {
        format!("Bearer {}", self.api_token)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, name, default)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
