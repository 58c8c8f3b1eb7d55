//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Sessions**: Sessions started, finished by outcome, and currently active
//! - **Tokens**: Token events pushed per tokenizer
//! - **Tokenizers**: Backend loads and their latency
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::session::SessionOutcome;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Calling this again returns the handle installed by the first call.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "streamer_sessions_started_total",
        "Total stream sessions started"
    );
    describe_counter!(
        "streamer_sessions_finished_total",
        "Total stream sessions finished by outcome"
    );
    describe_gauge!(
        "streamer_active_sessions",
        "Number of stream sessions currently running"
    );
    describe_counter!(
        "streamer_tokens_emitted_total",
        "Total token events pushed to viewers"
    );
    describe_histogram!(
        "streamer_session_duration_seconds",
        "Wall-clock duration of stream sessions"
    );

    describe_counter!(
        "streamer_tokenizer_loads_total",
        "Total tokenizer backend loads by result"
    );
    describe_histogram!(
        "streamer_tokenizer_load_seconds",
        "Time to load a tokenizer backend"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a session start.
pub fn record_session_started() {
    counter!("streamer_sessions_started_total").increment(1);
    gauge!("streamer_active_sessions").increment(1.0);
}

/// Record a session end.
pub fn record_session_finished(tokenizer: &str, outcome: &SessionOutcome, duration: Duration) {
    let outcome_label = outcome.state().as_str();

    gauge!("streamer_active_sessions").decrement(1.0);
    counter!(
        "streamer_sessions_finished_total",
        "outcome" => outcome_label
    )
    .increment(1);
    counter!(
        "streamer_tokens_emitted_total",
        "tokenizer" => tokenizer.to_string()
    )
    .increment(outcome.tokens_emitted() as u64);
    histogram!(
        "streamer_session_duration_seconds",
        "outcome" => outcome_label
    )
    .record(duration.as_secs_f64());
}

/// Record a tokenizer backend load.
pub fn record_tokenizer_load(tokenizer: &str, success: bool, duration: Duration) {
    counter!(
        "streamer_tokenizer_loads_total",
        "tokenizer" => tokenizer.to_string(),
        "result" => if success { "ok" } else { "error" }
    )
    .increment(1);
    histogram!(
        "streamer_tokenizer_load_seconds",
        "tokenizer" => tokenizer.to_string()
    )
    .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_session_started();
        record_session_finished(
            "gpt2",
            &SessionOutcome::Cancelled {
                emitted: 1,
                total: 2,
            },
            Duration::from_millis(3),
        );
        record_tokenizer_load("gpt2", false, Duration::from_millis(1));
    }

    #[test]
    fn init_is_idempotent() {
        let first = init_metrics().unwrap();
        let _second = init_metrics().unwrap();
        record_tokenizer_load("cl100k_base", true, Duration::from_millis(2));

        assert!(get_metrics_handle().is_some());
        assert!(first.render().contains("streamer_tokenizer_loads_total"));
    }
}
