//! Error types for backend adapters.

use std::io;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while talking to a remote store.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No usable credentials, or the store rejected them.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// The object, bucket, container or folder does not exist.
    #[error("not found: {key}")]
    NotFound {
        /// Key or target that was looked up.
        key: String,
    },

    /// Required input is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store answered with an unexpected status.
    #[error("remote returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or description.
        message: String,
    },

    /// A request or stream failed in flight.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The operation is not offered by this store.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Local file error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Repository error while resolving a target.
    #[error(transparent)]
    Core(#[from] cairn_core::CoreError),
}

impl BackendError {
    /// Creates a transfer error.
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    /// Creates a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Returns `true` if the error means the object is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transfer(err.to_string())
        }
    }
}
