//! Server-Sent Events Transport
//!
//! `GET /stream` opens a long-lived `text/event-stream` response and hands the
//! connection to exactly one [`StreamService`] session running on its own
//! task. Events travel from the session to the socket through a bounded
//! channel; when the viewer disconnects the response body (and with it the
//! receiver) is dropped, the next push fails, and the session cancels.
//!
//! # Framing
//!
//! ```text
//! data: {"token":"<div","index":0,"total":220}
//!
//! event: done
//! data: {"elapsed":1.234,"total_tokens":220,"tokenizer":"gpt2"}
//!
//! ```
//!
//! [`StreamService`]: crate::application::services::StreamService

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use super::AppState;
use crate::application::ports::{EventSink, SinkClosed};
use crate::domain::event::StreamEvent;
use crate::domain::session::SessionRequest;
use crate::infrastructure::metrics;

// =============================================================================
// Event Sink
// =============================================================================

/// [`EventSink`] backed by the channel feeding one SSE response.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl ChannelSink {
    /// Wrap the sending half of a response channel.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}

// =============================================================================
// Framing
// =============================================================================

/// Frame a stream event as an SSE event.
#[must_use]
pub fn to_sse_event(event: &StreamEvent) -> Event {
    let data = event.to_json().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize stream event");
        r#"{"error":"event serialization failed"}"#.to_string()
    });

    let frame = Event::default().data(data);
    match event.event_type() {
        Some(name) => frame.event(name),
        None => frame,
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Query parameters of `GET /stream`.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Tokenizer name; blank or missing uses the configured default.
    pub tokenizer: Option<String>,
    /// Milliseconds to pause after each token; missing uses the default.
    pub delay: Option<u64>,
}

impl StreamQuery {
    /// Fill in defaults from the server settings.
    #[must_use]
    pub fn into_request(self, state: &AppState) -> SessionRequest {
        let tokenizer = self
            .tokenizer
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| state.defaults.default_tokenizer.clone());
        let delay = self
            .delay
            .map_or(state.defaults.default_delay, Duration::from_millis);
        SessionRequest::new(tokenizer, delay)
    }
}

pub(super) async fn stream_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let request = query.into_request(&state);
    let (tx, rx) = mpsc::channel(state.defaults.channel_capacity);

    let service = state.service.clone();
    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        let tokenizer = request.tokenizer.clone();
        let started = Instant::now();

        metrics::record_session_started();
        let outcome = service.run(request, &mut sink).await;
        metrics::record_session_finished(&tokenizer, &outcome, started.elapsed());
    });

    let events = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(&event)));
    // Proxies such as nginx must not buffer the stream.
    ([("x-accel-buffering", "no")], Sse::new(events)).into_response()
}
