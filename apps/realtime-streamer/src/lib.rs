#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::cast_possible_truncation
    )
)]

//! Realtime Streamer - Tokenized Document Streaming
//!
//! An HTTP service that tokenizes a fixed HTML document with a
//! caller-chosen tokenizer and streams the decoded tokens back one at a time
//! over Server-Sent Events, paced by a caller-chosen delay. A browser viewer
//! renders the partial document as it arrives.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core types with no I/O
//!   - `tokenizer`: Catalog of names, backend handles, token ids
//!   - `document`: The streamed corpus and where it comes from
//!   - `event`: Token, done, and error payloads
//!   - `session`: Per-connection lifecycle state machine
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Event sink and tokenizer loader interfaces
//!   - `services`: Single-flight tokenizer registry, session runner, stats
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `tokenizers`: Hugging Face and tiktoken backends
//!   - `http`: axum router, SSE transport, health endpoints
//!   - `config`: Environment configuration
//!   - `metrics` / `telemetry`: Prometheus and tracing
//!
//! # Data Flow
//!
//! ```text
//! GET /stream ──► StreamService ──► TokenizerRegistry ──► backend (loaded once)
//!                      │
//!                      ├── encode(document) ──► [id, id, id, ...]
//!                      │
//!                      └── decode(id) ─► mpsc ─► SSE frame ──► viewer
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core types with no external I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::document::{Document, DocumentError, DocumentSource};
pub use domain::event::StreamEvent;
pub use domain::session::{SessionOutcome, SessionRequest, SessionState};
pub use domain::tokenizer::{TokenId, TokenizerCatalog, TokenizerError};

// Application services
pub use application::ports::{EventSink, SinkClosed, TokenizerLoader};
pub use application::services::{
    SessionStats, SessionStatsSnapshot, StreamService, TokenizerRegistry,
};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, ServerSettings, StreamSettings, StreamerConfig, TokenizerSettings,
};

// HTTP server
pub use infrastructure::http::{AppState, HttpServer, ServerError, router};

// Tokenizer backends
pub use infrastructure::tokenizers::BackendLoader;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
