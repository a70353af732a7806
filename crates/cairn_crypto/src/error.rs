//! Error types for the encryption codec.

use std::io;
use thiserror::Error;

/// Result type for codec operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while deriving keys or transforming files.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// An I/O error occurred on the source or destination.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input is not in the encrypted format, or failed authentication.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The passphrase could not be turned into a key.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// A raw key had the wrong length.
    #[error("invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize {
        /// Required key length.
        expected: usize,
        /// Supplied key length.
        actual: usize,
    },

    /// The vault document holds unusable parameters.
    #[error("invalid vault: {0}")]
    InvalidVault(String),
}

impl CryptoError {
    /// Creates a decryption error with the given message.
    pub fn decryption(msg: impl Into<String>) -> Self {
        Self::Decryption(msg.into())
    }

    /// The error returned when the magic header is missing.
    pub fn not_encrypted() -> Self {
        Self::Decryption("not an encrypted file".into())
    }

    /// Returns `true` for authentication and format failures.
    #[must_use]
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }
}
