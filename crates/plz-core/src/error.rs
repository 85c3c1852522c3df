//! Error types for the PLZ sync system
//!
//! Lookup outcomes (no results, transport failure) are not errors at the engine
//! level: they are folded into per-field messages. This type covers everything
//! that can go wrong around them.

use thiserror::Error;

/// Result type alias for PLZ operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the PLZ sync system
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup service errors (transport, status, decoding)
    #[error("Lookup error ({service}): {message}")]
    Lookup {
        /// Service name
        service: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The engine loop is no longer running
    #[error("Engine stopped")]
    EngineStopped,

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a lookup service error
    pub fn lookup(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
