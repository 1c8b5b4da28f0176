//! ttstream - MP3 reassembly for streamed text-to-speech responses
//!
//! Turns a server-sent-event style response whose records carry base64 MP3
//! fragments into a continuous, header-aligned stream of MP3 frames.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod source;

// Core traits (source → process → sink)
pub use pipeline::sink::FrameSink;
pub use source::ChunkSource;

// Pipeline
pub use pipeline::orchestrator::{ChunkFeeder, PipelineConfig, PipelineHandle, StreamPipeline};
pub use pipeline::types::{Mp3Frame, StreamStats};

// Error handling
pub use error::{Result, StreamError};

// Config
pub use config::Config;

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
