//! Core error types for configuration and run setup.

use thiserror::Error;

/// Error raised while loading configuration or preparing a run.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more required settings are absent
    #[error("Missing configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
