//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! None of these escape the core operations: the transport observes
//! `TransportError` internally and `init` turns `ConfigError` into a warning.

use thiserror::Error;

/// Errors that can occur while delivering an event
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Ingest endpoint responded with HTTP {0}")]
    Status(u16),

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No async runtime available to deliver the event")]
    NoRuntime,
}

/// Errors that can occur while validating client configuration
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("DSN is required")]
    MissingDsn,

    #[error("Invalid DSN: {0}")]
    InvalidDsn(String),

    #[error("Sample rate must be a number in [0, 1], got {0}")]
    InvalidSampleRate(f64),
}
