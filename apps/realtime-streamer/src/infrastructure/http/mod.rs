//! HTTP Server
//!
//! One axum router serves the viewer page, the token stream, and the
//! operational endpoints.
//!
//! # Endpoints
//!
//! - `GET /` - HTML viewer
//! - `GET /stream?tokenizer=<name>&delay=<ms>` - token stream (SSE)
//! - `GET /health`, `/healthz`, `/readyz`, `/metrics` - see [`health`]
//!
//! Any other path answers 404. A `delay` that is not a non-negative integer
//! answers 400 before a session starts.

pub mod health;
pub mod sse;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::response::Html;
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::StreamService;
use crate::infrastructure::config::StreamSettings;

pub use sse::{ChannelSink, StreamQuery, to_sse_event};

const VIEWER_HTML: &str = include_str!("../../../assets/viewer.html");

// =============================================================================
// Shared State
// =============================================================================

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    service: StreamService,
    defaults: StreamSettings,
    preload: bool,
    version: String,
    started_at: Instant,
}

impl AppState {
    /// Create handler state.
    #[must_use]
    pub fn new(service: StreamService, defaults: StreamSettings, version: impl Into<String>) -> Self {
        Self {
            service,
            defaults,
            preload: false,
            version: version.into(),
            started_at: Instant::now(),
        }
    }

    /// Report readiness only once the default tokenizer is loaded.
    #[must_use]
    pub const fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// The session runner.
    #[must_use]
    pub const fn service(&self) -> &StreamService {
        &self.service
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(viewer_handler))
        .route("/stream", get(sse::stream_handler))
        .route("/health", get(health::health_handler))
        .route("/healthz", get(health::liveness_handler))
        .route("/readyz", get(health::readiness_handler))
        .route("/metrics", get(health::metrics_handler))
        .with_state(state)
}

async fn viewer_handler() -> Html<&'static str> {
    Html(VIEWER_HTML)
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server for the streamer.
pub struct HttpServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Create a new server.
    #[must_use]
    pub fn new(bind_addr: IpAddr, port: u16, state: Arc<AppState>, cancel: CancellationToken) -> Self {
        Self {
            addr: SocketAddr::new(bind_addr, port),
            state,
            cancel,
        }
    }

    /// Bind and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::BindFailed(self.addr, e.to_string()))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ServerFailed` on a fatal server error.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let local = listener.local_addr().unwrap_or(self.addr);
        tracing::info!(addr = %local, "Streaming server listening on http://{local}");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Streaming server stopped");
        Ok(())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}
