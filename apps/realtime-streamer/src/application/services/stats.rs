//! Session Counters
//!
//! Lock-free tallies of session lifecycles, reported by the health endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::domain::session::SessionOutcome;

/// Process-wide session counters.
#[derive(Debug, Default)]
pub struct SessionStats {
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    tokens_emitted: AtomicU64,
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatsSnapshot {
    /// Sessions currently running.
    pub active: u64,
    /// Sessions started since boot.
    pub started: u64,
    /// Sessions that delivered `done`.
    pub completed: u64,
    /// Sessions that delivered `error`.
    pub failed: u64,
    /// Sessions ended by a disconnect.
    pub cancelled: u64,
    /// Token events pushed across all sessions.
    pub tokens_emitted: u64,
}

impl SessionStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session start.
    pub fn session_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session end.
    pub fn session_finished(&self, outcome: &SessionOutcome) {
        let counter = match outcome {
            SessionOutcome::Completed { .. } => &self.completed,
            SessionOutcome::Failed(_) => &self.failed,
            SessionOutcome::Cancelled { .. } => &self.cancelled,
        };
        self.tokens_emitted
            .fetch_add(outcome.tokens_emitted() as u64, Ordering::Relaxed);
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        let started = self.started.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let cancelled = self.cancelled.load(Ordering::Relaxed);
        SessionStatsSnapshot {
            active: started.saturating_sub(completed + failed + cancelled),
            started,
            completed,
            failed,
            cancelled,
            tokens_emitted: self.tokens_emitted.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::tokenizer::TokenizerError;

    #[test]
    fn counts_each_outcome() {
        let stats = SessionStats::new();
        for _ in 0..4 {
            stats.session_started();
        }
        stats.session_finished(&SessionOutcome::Completed {
            total_tokens: 10,
            elapsed: Duration::from_millis(5),
        });
        stats.session_finished(&SessionOutcome::Failed(TokenizerError::UnknownTokenizer(
            "x".to_string(),
        )));
        stats.session_finished(&SessionOutcome::Cancelled {
            emitted: 3,
            total: 10,
        });

        let snap = stats.snapshot();
        assert_eq!(snap.started, 4);
        assert_eq!(snap.active, 1);
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.cancelled, 1);
        assert_eq!(snap.tokens_emitted, 13);
    }
}
