//! Health Check and Metrics Endpoints
//!
//! - `GET /health` - JSON status: sessions, tokenizers, document
//! - `GET /healthz` - liveness probe (simple OK)
//! - `GET /readyz` - readiness probe (default tokenizer warm when preloading)
//! - `GET /metrics` - Prometheus metrics in text format

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;
use crate::application::services::SessionStatsSnapshot;
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded".
    pub status: HealthStatus,
    /// Server version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Session counters since start.
    pub sessions: SessionStatsSnapshot,
    /// Tokenizer cache status.
    pub tokenizers: TokenizerStatus,
    /// Streamed corpus.
    pub document: DocumentStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Ready to stream.
    Healthy,
    /// Serving, but the default tokenizer is still warming up.
    Degraded,
}

/// Tokenizer cache status.
#[derive(Debug, Clone, Serialize)]
pub struct TokenizerStatus {
    /// Tokenizer used when a request names none.
    pub default: String,
    /// Tokenizers resident in the cache.
    pub loaded: Vec<String>,
    /// Every name a request may use.
    pub available: Vec<String>,
}

/// Streamed corpus status.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStatus {
    /// Where the text came from.
    pub origin: String,
    /// Length in bytes.
    pub bytes: usize,
}

// =============================================================================
// HTTP Handlers
// =============================================================================

pub(super) async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(build_health_response(&state)))
}

pub(super) async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub(super) async fn readiness_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if is_ready(&state) {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

pub(super) async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

fn is_ready(state: &AppState) -> bool {
    let default_loaded = state
        .service
        .registry()
        .is_loaded(&state.defaults.default_tokenizer);
    determine_health_status(state.preload, default_loaded) == HealthStatus::Healthy
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let registry = state.service.registry();
    let document = state.service.document();
    let default = state.defaults.default_tokenizer.clone();

    HealthResponse {
        status: determine_health_status(state.preload, registry.is_loaded(&default)),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        sessions: state.service.stats().snapshot(),
        tokenizers: TokenizerStatus {
            default,
            loaded: registry.loaded_names(),
            available: registry.known_names(),
        },
        document: DocumentStatus {
            origin: document.origin().to_string(),
            bytes: document.len(),
        },
    }
}

const fn determine_health_status(preload: bool, default_loaded: bool) -> HealthStatus {
    if preload && !default_loaded {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test]
    fn lazy_loading_is_always_healthy() {
        assert_eq!(determine_health_status(false, false), HealthStatus::Healthy);
        assert_eq!(determine_health_status(false, true), HealthStatus::Healthy);
    }

    #[test]
    fn preload_degraded_until_default_loaded() {
        assert_eq!(determine_health_status(true, false), HealthStatus::Degraded);
        assert_eq!(determine_health_status(true, true), HealthStatus::Healthy);
    }
}
