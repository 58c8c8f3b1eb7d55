//! Tokenizer Domain Types
//!
//! Names, backend families, loaded handles, and the failures a stream can hit
//! while resolving or running a tokenizer.

mod catalog;
mod handle;

pub use catalog::{
    BackendFamily, DEFAULT_HF_REPOS, TiktokenEncoding, TokenizerCatalog, TokenizerSpec,
};
pub use handle::{Backend, TokenizerHandle};

/// A single vocabulary id.
pub type TokenId = u32;

/// Tokenizer resolution and encoding failures.
///
/// All variants are contained to the session that hit them and surface as a
/// single `error` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizerError {
    /// Name is not a recognized backend identifier.
    #[error("unknown tokenizer: {0}")]
    UnknownTokenizer(String),

    /// Backend failed to initialize.
    #[error("failed to load tokenizer {name}: {reason}")]
    LoadFailure {
        /// Tokenizer name.
        name: String,
        /// Underlying cause.
        reason: String,
    },

    /// Backend rejected the document.
    #[error("failed to encode document with {name}: {reason}")]
    Encode {
        /// Tokenizer name.
        name: String,
        /// Underlying cause.
        reason: String,
    },
}

impl TokenizerError {
    /// Build a load failure from any displayable cause.
    pub fn load_failure(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::LoadFailure {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTokenizer(_) => "unknown_tokenizer",
            Self::LoadFailure { .. } => "load_failure",
            Self::Encode { .. } => "encode_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            TokenizerError::UnknownTokenizer("nope".to_string()).to_string(),
            "unknown tokenizer: nope"
        );
        assert_eq!(
            TokenizerError::load_failure("gpt2", "connection refused").to_string(),
            "failed to load tokenizer gpt2: connection refused"
        );
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            TokenizerError::UnknownTokenizer(String::new()).kind(),
            "unknown_tokenizer"
        );
        assert_eq!(TokenizerError::load_failure("x", "y").kind(), "load_failure");
        assert_eq!(
            TokenizerError::Encode {
                name: "x".to_string(),
                reason: "y".to_string()
            }
            .kind(),
            "encode_failure"
        );
    }
}
