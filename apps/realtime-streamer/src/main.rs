//! Realtime Streamer Binary
//!
//! Serves the token-streaming viewer and its SSE endpoint.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin realtime-streamer
//! ```
//!
//! # Environment Variables
//!
//! - `STREAMER_PORT`: HTTP port (default: 8080)
//! - `STREAMER_BIND_ADDR`: Listen address (default: 0.0.0.0)
//! - `STREAMER_DEFAULT_TOKENIZER`: Tokenizer when a request names none (default: gpt2)
//! - `STREAMER_DEFAULT_DELAY_MS`: Delay when a request names none (default: 20)
//! - `STREAMER_CHANNEL_CAPACITY`: Events buffered per connection (default: 64)
//! - `STREAMER_DOCUMENT_PATH`: Corpus file (default: bundled dashboard)
//! - `STREAMER_TOKENIZER_DIR`: Local `<repo>/tokenizer.json` files checked before the Hub
//! - `STREAMER_HF_TOKENIZERS`: Extra comma-separated Hub repositories
//! - `STREAMER_PRELOAD`: Load the default tokenizer at start-up (default: false)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use realtime_streamer::infrastructure::http::{AppState, HttpServer};
use realtime_streamer::infrastructure::telemetry;
use realtime_streamer::{
    BackendLoader, DocumentSource, StreamService, StreamerConfig, TokenizerCatalog,
    TokenizerRegistry, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let telemetry_guard = telemetry::init();

    tracing::info!(
        trace_export = telemetry_guard.exporting(),
        "Starting Realtime Streamer"
    );

    // Initialize Prometheus metrics
    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Metrics disabled");
    }

    let config = StreamerConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let document = DocumentSource::from_path(config.document_path.as_deref())
        .load()
        .await
        .context("failed to load document")?;
    tracing::info!(origin = document.origin(), bytes = document.len(), "Document loaded");

    let shutdown_token = CancellationToken::new();

    // Tokenizer registry: closed catalog, loaded on first use
    let loader = Arc::new(BackendLoader::new(config.tokenizers.tokenizer_dir.clone()));
    let catalog = TokenizerCatalog::new(config.tokenizers.extra_hf_repos.clone());
    let registry = Arc::new(TokenizerRegistry::new(catalog, loader));

    if config.tokenizers.preload {
        let registry = Arc::clone(&registry);
        let name = config.stream.default_tokenizer.clone();
        tokio::spawn(async move {
            match registry.resolve(&name).await {
                Ok(_) => tracing::info!(tokenizer = %name, "Default tokenizer preloaded"),
                Err(e) => tracing::warn!(tokenizer = %name, error = %e, "Preload failed"),
            }
        });
    }

    let service = StreamService::new(registry, document);
    let state = Arc::new(
        AppState::new(service, config.stream.clone(), env!("CARGO_PKG_VERSION"))
            .with_preload(config.tokenizers.preload),
    );

    let server = HttpServer::new(
        config.server.bind_addr,
        config.server.port,
        state,
        shutdown_token.clone(),
    );
    let mut server_task = tokio::spawn(server.run());

    tracing::info!("Realtime streamer ready");

    tokio::select! {
        () = await_shutdown(shutdown_token) => {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server_task).await {
                Ok(joined) => joined.context("server task panicked")??,
                Err(_) => tracing::warn!("Open streams did not finish before the shutdown timeout"),
            }
        }
        joined = &mut server_task => {
            joined.context("server task panicked")??;
        }
    }

    tracing::info!("Realtime streamer stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &StreamerConfig) {
    tracing::info!(
        bind_addr = %config.server.bind_addr,
        port = config.server.port,
        default_tokenizer = %config.stream.default_tokenizer,
        default_delay_ms = config.stream.default_delay.as_millis(),
        preload = config.tokenizers.preload,
        "Configuration loaded"
    );
    tracing::debug!(
        channel_capacity = config.stream.channel_capacity,
        tokenizer_dir = ?config.tokenizers.tokenizer_dir,
        extra_hf_repos = ?config.tokenizers.extra_hf_repos,
        document_path = ?config.document_path,
        "Stream settings"
    );
}

/// Load .env file from any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
