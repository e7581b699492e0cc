use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use ollama_gate::{
    backend::BackendClient, build_router, config::AppConfig, telemetry, warmup, AppState,
};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    telemetry::init_tracing(config.log_format);
    let config = Arc::new(config);
    debug!(
        "Configuration loaded: host={}, port={}, backend={}, model={}",
        config.host, config.port, config.backend_url, config.model_name
    );

    let backend = match BackendClient::new(&config) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Failed to create backend client: {}", e);
            std::process::exit(1);
        }
    };

    debug!("Setting up CORS layer with 1-hour max age");
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = build_router(AppState::new(config.clone(), backend.clone())).layer(cors);

    let shutdown = CancellationToken::new();
    tokio::spawn(warmup::start(
        backend,
        config.clone(),
        shutdown.child_token(),
    ));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!(
        "Ollama gate listening on {} (backend {}, model {})",
        addr, config.backend_url, config.model_name
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .unwrap_or_else(|e| {
            error!("Server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler")
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            debug!("CTRL+C signal received");
        },
        _ = terminate => {
            debug!("Terminate signal received");
        },
    }
    info!("Shutdown signal received, stopping keepalive and draining requests");
    shutdown.cancel();
}
