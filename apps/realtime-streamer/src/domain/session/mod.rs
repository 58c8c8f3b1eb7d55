//! Stream Session State Machine
//!
//! Per-connection replay state. A session is created when a stream request
//! arrives and is mutated only by its own emission loop.
//!
//! ```text
//! Initializing ──► Emitting ──► Completed
//!       │              │
//!       ▼              ▼
//!     Failed       Cancelled
//! ```

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::domain::tokenizer::{TokenId, TokenizerError};

// =============================================================================
// Request
// =============================================================================

/// Parameters a viewer supplies when opening a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Tokenizer name.
    pub tokenizer: String,
    /// Pause after each emitted token.
    pub delay: Duration,
}

impl SessionRequest {
    /// Create a request.
    #[must_use]
    pub fn new(tokenizer: impl Into<String>, delay: Duration) -> Self {
        Self {
            tokenizer: tokenizer.into(),
            delay,
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Resolving the tokenizer and encoding the document.
    Initializing,
    /// Pushing tokens to the viewer.
    Emitting,
    /// Every token was pushed and `done` was sent.
    Completed,
    /// Tokenizer resolution or encoding failed; `error` was sent.
    Failed,
    /// The viewer went away; nothing more is sent.
    Cancelled,
}

impl SessionState {
    /// Whether the session can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether `next` is a legal successor of this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initializing, Self::Emitting | Self::Failed)
                | (Self::Emitting, Self::Completed | Self::Cancelled)
        )
    }

    /// State name for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Emitting => "emitting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// All tokens and the `done` event were delivered.
    Completed {
        /// Tokens emitted.
        total_tokens: usize,
        /// Time spent emitting.
        elapsed: Duration,
    },
    /// The tokenizer could not be resolved or could not encode the document.
    Failed(TokenizerError),
    /// The viewer disconnected.
    Cancelled {
        /// Tokens pushed before the disconnect was noticed.
        emitted: usize,
        /// Length of the id sequence, zero if encoding had not finished.
        total: usize,
    },
}

impl SessionOutcome {
    /// Terminal state this outcome corresponds to.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        match self {
            Self::Completed { .. } => SessionState::Completed,
            Self::Failed(_) => SessionState::Failed,
            Self::Cancelled { .. } => SessionState::Cancelled,
        }
    }

    /// Number of `token` events pushed.
    #[must_use]
    pub const fn tokens_emitted(&self) -> usize {
        match self {
            Self::Completed { total_tokens, .. } => *total_tokens,
            Self::Failed(_) => 0,
            Self::Cancelled { emitted, .. } => *emitted,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Replay state of one connection.
#[derive(Debug)]
pub struct StreamSession {
    id: Uuid,
    request: SessionRequest,
    state: SessionState,
    token_ids: Vec<TokenId>,
    position: usize,
    started_at: Option<Instant>,
}

impl StreamSession {
    /// Create a session in `Initializing`.
    #[must_use]
    pub fn new(request: SessionRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            state: SessionState::Initializing,
            token_ids: Vec::new(),
            position: 0,
            started_at: None,
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Requested tokenizer name.
    #[must_use]
    pub fn tokenizer_name(&self) -> &str {
        &self.request.tokenizer
    }

    /// Pause after each emitted token.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.request.delay
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Length of the id sequence (zero before encoding).
    #[must_use]
    pub fn total(&self) -> usize {
        self.token_ids.len()
    }

    /// Index of the next id to emit; equals the number already emitted.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Time since emission started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// Install the encoded ids and start the emission clock.
    pub fn begin_emitting(&mut self, token_ids: Vec<TokenId>) {
        self.transition(SessionState::Emitting);
        self.token_ids = token_ids;
        self.position = 0;
        self.started_at = Some(Instant::now());
    }

    /// The next `(index, id)` to emit, if any remain.
    #[must_use]
    pub fn next_token(&self) -> Option<(usize, TokenId)> {
        if self.state != SessionState::Emitting {
            return None;
        }
        self.token_ids
            .get(self.position)
            .map(|&id| (self.position, id))
    }

    /// Record that the current token was pushed.
    pub fn advance(&mut self) {
        debug_assert!(self.position < self.token_ids.len());
        self.position += 1;
    }

    /// Whether ids remain after the current position.
    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.position < self.token_ids.len()
    }

    /// Move to `Completed`, returning the outcome.
    pub fn complete(&mut self) -> SessionOutcome {
        self.transition(SessionState::Completed);
        SessionOutcome::Completed {
            total_tokens: self.token_ids.len(),
            elapsed: self.elapsed(),
        }
    }

    /// Move to `Failed`, returning the outcome.
    pub fn fail(&mut self, error: TokenizerError) -> SessionOutcome {
        self.transition(SessionState::Failed);
        SessionOutcome::Failed(error)
    }

    /// Move to `Cancelled`, discarding the encoded ids.
    pub fn cancel(&mut self) -> SessionOutcome {
        self.transition(SessionState::Cancelled);
        let outcome = SessionOutcome::Cancelled {
            emitted: self.position,
            total: self.token_ids.len(),
        };
        self.token_ids = Vec::new();
        outcome
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal session transition {} -> {}",
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }
}
