//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Per-event relay failures. None of these stop the process; the event is dropped.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Unknown message origin: {platform}")]
    UnknownOrigin { platform: String },

    #[error("Unknown event kind: {kind}")]
    UnknownEventKind { kind: String },

    #[error("Failed to send to {target}: {message}")]
    AdapterSend { target: String, message: String },

    #[error("User lookup for {user_id} failed: {message}")]
    Lookup { user_id: u64, message: String },
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for relay operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;
