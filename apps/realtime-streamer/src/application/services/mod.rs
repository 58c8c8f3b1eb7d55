//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `TokenizerRegistry`: Single-flight cache of loaded tokenizers
//! - `StreamService`: Runs one replay session per viewer connection
//! - `SessionStats`: Session lifecycle counters

mod registry;
mod stats;
mod stream;

pub use registry::TokenizerRegistry;
pub use stats::{SessionStats, SessionStatsSnapshot};
pub use stream::StreamService;
