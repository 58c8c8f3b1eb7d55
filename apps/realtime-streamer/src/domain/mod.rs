//! Domain Layer - Core replay types and business rules.
//!
//! Tokenizer identity and handles, the corpus, the events a viewer receives,
//! and the per-connection session state machine.

/// Tokenizer catalog, handles, and errors.
pub mod tokenizer;

/// The static corpus.
pub mod document;

/// Events pushed to viewers.
pub mod event;

/// Per-connection session state machine.
pub mod session;
