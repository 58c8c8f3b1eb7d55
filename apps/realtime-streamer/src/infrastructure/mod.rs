//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Tokenizer backends (Hugging Face, tiktoken).
pub mod tokenizers;

/// HTTP server: viewer, SSE stream, health, and metrics routes.
pub mod http;

/// Configuration loaded from the environment.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
