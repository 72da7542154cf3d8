//! Error types for the Quotaguard service.

use thiserror::Error;

/// Main error type for Quotaguard operations.
#[derive(Error, Debug)]
pub enum QuotaguardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for QuotaguardError {
    fn from(err: ::config::ConfigError) -> Self {
        QuotaguardError::Config(err.to_string())
    }
}

/// Result type alias for Quotaguard operations.
pub type Result<T> = std::result::Result<T, QuotaguardError>;
