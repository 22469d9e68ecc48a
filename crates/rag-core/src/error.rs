//! Error types for the retrieval system.

use thiserror::Error;

/// Result type alias using RagError.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur during retrieval.
///
/// A document reported missing by the store is not an error; see
/// [`crate::StoreGateway::get_document`].
#[derive(Error, Debug)]
pub enum RagError {
    /// Store gateway failure (network, storage backend).
    #[error("Store error: {message}")]
    Store { message: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The retrieval call did not complete in time.
    #[error("Retrieval timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get a stable error code for callers that report errors over a wire.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Store { .. } => "STORE_ERROR",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
