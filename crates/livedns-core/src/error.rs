//! Error types for the livedns reconciler
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for livedns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the livedns reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Remote record absent
    ///
    /// The reconciler treats this as the "logically absent" state during
    /// read and delete, and as a genuine failure everywhere else.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Identity string does not split into `zone/name/type`
    #[error("Malformed record id '{0}': expected '{{zone}}/{{name}}/{{type}}'")]
    MalformedId(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// HTTP client errors (from record store APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Record store specific error
    #[error("Record store error ({provider}): {message}")]
    Provider {
        /// Record store name
        provider: String,
        /// Error message
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a malformed id error
    pub fn malformed_id(id: impl Into<String>) -> Self {
        Self::MalformedId(id.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a record store specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the remote record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
