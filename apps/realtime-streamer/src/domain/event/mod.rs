//! Stream Events
//!
//! What a session tells its viewer. A session emits zero or more `Token`
//! events with increasing `index`, then exactly one terminal `Done` or
//! `Error`.

use serde::Serialize;

/// Payload of a `Token` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPayload {
    /// Decoded text of this single id.
    pub token: String,
    /// Zero-based position in the id sequence.
    pub index: usize,
    /// Length of the id sequence.
    pub total: usize,
}

/// Payload of the `Done` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonePayload {
    /// Wall-clock seconds spent emitting, rounded to milliseconds.
    pub elapsed: f64,
    /// Number of tokens emitted.
    pub total_tokens: usize,
    /// Tokenizer that produced them.
    pub tokenizer: String,
}

/// Payload of the `Error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// Human-readable failure.
    pub error: String,
}

/// One event pushed to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One decoded token.
    Token(TokenPayload),
    /// Session finished normally.
    Done(DonePayload),
    /// Session failed before emitting any token.
    Error(ErrorPayload),
}

impl StreamEvent {
    /// Build a token event.
    pub fn token(token: impl Into<String>, index: usize, total: usize) -> Self {
        Self::Token(TokenPayload {
            token: token.into(),
            index,
            total,
        })
    }

    /// Build the completion event. `elapsed_secs` is rounded to milliseconds.
    pub fn done(elapsed_secs: f64, total_tokens: usize, tokenizer: impl Into<String>) -> Self {
        Self::Done(DonePayload {
            elapsed: (elapsed_secs * 1000.0).round() / 1000.0,
            total_tokens,
            tokenizer: tokenizer.into(),
        })
    }

    /// Build the failure event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            error: message.into(),
        })
    }

    /// Event name on the wire; `None` means the default `message` type.
    #[must_use]
    pub const fn event_type(&self) -> Option<&'static str> {
        match self {
            Self::Token(_) => None,
            Self::Done(_) => Some("done"),
            Self::Error(_) => Some("error"),
        }
    }

    /// Whether this event ends the session.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Token(_))
    }

    /// JSON body of the `data:` line.
    ///
    /// # Errors
    ///
    /// Propagates a `serde_json` failure. The payloads are plain strings and
    /// numbers, so this does not happen in practice; a non-finite `elapsed`
    /// is written as `null`, not rejected.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Token(payload) => serde_json::to_string(payload),
            Self::Done(payload) => serde_json::to_string(payload),
            Self::Error(payload) => serde_json::to_string(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_json_shape() {
        let event = StreamEvent::token("<div", 3, 220);
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"token":"<div","index":3,"total":220}"#
        );
        assert_eq!(event.event_type(), None);
        assert!(!event.is_terminal());
    }

    #[test]
    fn done_json_shape_and_rounding() {
        let event = StreamEvent::done(1.234_56, 220, "gpt2");
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"elapsed":1.235,"total_tokens":220,"tokenizer":"gpt2"}"#
        );
        assert_eq!(event.event_type(), Some("done"));
        assert!(event.is_terminal());
    }

    #[test]
    fn non_finite_elapsed_serializes_as_null() {
        let event = StreamEvent::done(f64::NAN, 0, "gpt2");
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"elapsed":null,"total_tokens":0,"tokenizer":"gpt2"}"#
        );
    }

    #[test]
    fn error_json_shape() {
        let event = StreamEvent::error("unknown tokenizer: nope");
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"error":"unknown tokenizer: nope"}"#
        );
        assert_eq!(event.event_type(), Some("error"));
        assert!(event.is_terminal());
    }

    #[test]
    fn token_text_is_json_escaped() {
        let event = StreamEvent::token("\"a\"\n", 0, 1);
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"token":"\"a\"\n","index":0,"total":1}"#
        );
    }
}
