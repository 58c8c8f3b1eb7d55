//! Port Interfaces
//!
//! Contracts between the replay logic and its adapters.
//!
//! ## Driven Ports (Outbound)
//!
//! - `EventSink`: Pushes session events to one connected viewer
//! - `TokenizerLoader`: Builds a tokenizer backend from its spec

use async_trait::async_trait;

use crate::domain::event::StreamEvent;
use crate::domain::tokenizer::{TokenizerError, TokenizerHandle, TokenizerSpec};

/// The viewer is gone; the event was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Push side of one viewer connection.
#[async_trait]
pub trait EventSink: Send {
    /// Push one event, waiting while the transport is full.
    ///
    /// # Errors
    ///
    /// Returns [`SinkClosed`] once the peer has disconnected.
    async fn send(&mut self, event: StreamEvent) -> Result<(), SinkClosed>;
}

/// Loads tokenizer backends. Called at most once per name at a time.
#[async_trait]
pub trait TokenizerLoader: Send + Sync {
    /// Build the backend for `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::LoadFailure`] if the backend cannot be initialized.
    async fn load(&self, spec: &TokenizerSpec) -> Result<TokenizerHandle, TokenizerError>;
}
