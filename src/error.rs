//! Error types for ttstream.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Record-level errors (recoverable, the record is skipped)
    #[error("Malformed record: {message}")]
    RecordParse { message: String, record: String },

    #[error("Invalid audio payload: {message}")]
    PayloadDecode { message: String },

    // Stream-level errors
    #[error("Transport failed: {message}")]
    Transport { message: String },

    #[error("Sink {sink} failed: {message}")]
    SinkFailed { sink: String, message: String },

    #[error("Stream already finished")]
    StreamFinished,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl StreamError {
    /// Whether the error only affects a single record and the stream may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StreamError::RecordParse { .. } | StreamError::PayloadDecode { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, StreamError>;
