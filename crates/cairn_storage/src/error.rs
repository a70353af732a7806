//! Error types for state store operations.

use std::io;
use thiserror::Error;

/// Result type for state store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing state documents.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document could not be encoded.
    #[error("failed to encode {document}: {source}")]
    Encode {
        /// File name of the document.
        document: &'static str,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// A document exists but could not be parsed.
    #[error("document {document} is corrupted: {reason}")]
    Corrupted {
        /// File name of the document.
        document: &'static str,
        /// Parser message.
        reason: String,
    },
}
