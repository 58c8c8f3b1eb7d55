//! Stream Service
//!
//! Drives one session from request to terminal event: resolve the tokenizer,
//! encode the document once, then push one `token` event per id, pausing
//! `delay` between pushes, and finish with `done`. Resolution or encode
//! failures produce a single `error` event. A failed push means the viewer
//! left; the loop stops without sending anything else.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use super::{SessionStats, TokenizerRegistry};
use crate::application::ports::EventSink;
use crate::domain::document::Document;
use crate::domain::event::StreamEvent;
use crate::domain::session::{SessionOutcome, SessionRequest, StreamSession};
use crate::domain::tokenizer::{TokenId, TokenizerError, TokenizerHandle};

/// Replays the document to viewers.
#[derive(Debug, Clone)]
pub struct StreamService {
    registry: Arc<TokenizerRegistry>,
    document: Document,
    stats: Arc<SessionStats>,
}

impl StreamService {
    /// Create a service over a loaded document and a shared registry.
    #[must_use]
    pub fn new(registry: Arc<TokenizerRegistry>, document: Document) -> Self {
        Self {
            registry,
            document,
            stats: Arc::new(SessionStats::new()),
        }
    }

    /// The tokenizer registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<TokenizerRegistry> {
        &self.registry
    }

    /// The corpus being replayed.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Session counters.
    #[must_use]
    pub const fn stats(&self) -> &Arc<SessionStats> {
        &self.stats
    }

    /// Run one session to completion against `sink`.
    pub async fn run<S>(&self, request: SessionRequest, sink: &mut S) -> SessionOutcome
    where
        S: EventSink + ?Sized,
    {
        let mut session = StreamSession::new(request);
        let span = tracing::info_span!(
            "stream_session",
            session_id = %session.id(),
            tokenizer = session.tokenizer_name(),
            delay_ms = u64::try_from(session.delay().as_millis()).unwrap_or(u64::MAX),
        );

        self.stats.session_started();
        let outcome = self.drive(&mut session, sink).instrument(span).await;
        self.stats.session_finished(&outcome);
        outcome
    }

    async fn drive<S>(&self, session: &mut StreamSession, sink: &mut S) -> SessionOutcome
    where
        S: EventSink + ?Sized,
    {
        let handle = match self.registry.resolve(session.tokenizer_name()).await {
            Ok(handle) => handle,
            Err(e) => return Self::fail(session, sink, e).await,
        };

        let ids = match self.encode(&handle).await {
            Ok(ids) => ids,
            Err(e) => return Self::fail(session, sink, e).await,
        };

        let total = ids.len();
        let delay = session.delay();
        tracing::info!(total, "Streaming document");
        session.begin_emitting(ids);

        while let Some((index, id)) = session.next_token() {
            let event = StreamEvent::token(handle.decode(id), index, total);
            if sink.send(event).await.is_err() {
                tracing::debug!(emitted = index, total, "Viewer disconnected");
                return session.cancel();
            }
            session.advance();

            if !delay.is_zero() && session.has_remaining() {
                tokio::time::sleep(delay).await;
            }
        }

        let outcome = session.complete();
        let elapsed = match &outcome {
            SessionOutcome::Completed { elapsed, .. } => *elapsed,
            _ => Duration::ZERO,
        };
        tracing::info!(
            total,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Stream completed"
        );

        let done = StreamEvent::done(elapsed.as_secs_f64(), total, handle.name());
        if sink.send(done).await.is_err() {
            tracing::debug!("Viewer disconnected before done event");
        }
        outcome
    }

    /// Encode the whole document on the blocking pool.
    async fn encode(&self, handle: &Arc<TokenizerHandle>) -> Result<Vec<TokenId>, TokenizerError> {
        let handle = Arc::clone(handle);
        let document = self.document.clone();
        let name = handle.name().to_string();

        tokio::task::spawn_blocking(move || handle.encode(document.text()))
            .await
            .unwrap_or_else(|e| {
                Err(TokenizerError::Encode {
                    name,
                    reason: e.to_string(),
                })
            })
    }

    async fn fail<S>(session: &mut StreamSession, sink: &mut S, error: TokenizerError) -> SessionOutcome
    where
        S: EventSink + ?Sized,
    {
        tracing::warn!(error = %error, kind = error.kind(), "Stream failed");
        if sink.send(StreamEvent::error(error.to_string())).await.is_err() {
            tracing::debug!("Viewer disconnected before error event");
        }
        session.fail(error)
    }
}
