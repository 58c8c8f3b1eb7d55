//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with viewers and tokenizer backends.

/// Port interfaces for external systems (event sinks, tokenizer loaders).
pub mod ports;

/// Application services for tokenizer resolution and session replay.
pub mod services;
