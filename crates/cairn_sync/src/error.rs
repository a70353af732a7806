//! Error types for the sync engine.

use cairn_backend::BackendError;
use cairn_core::{BackendKind, CoreError};
use cairn_crypto::CryptoError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Repository or state error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Remote store error.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Encryption or key derivation error.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The target does not exist or cannot be accessed.
    #[error("cannot access {} {target} (check credentials and the {})", kind.label(), kind.target_noun())]
    RemoteInaccessible {
        /// Store kind.
        kind: BackendKind,
        /// Folder id, bucket or container.
        target: String,
    },

    /// A single file failed to transfer.
    #[error("transfer of {path} failed: {message}")]
    Transfer {
        /// Root-relative path or remote key.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Required input is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The user declined a confirmation.
    #[error("cancelled")]
    Cancelled,
}

impl SyncError {
    /// Creates a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Returns `true` for errors confined to one file.
    ///
    /// Batch operations count these and continue; anything else aborts.
    #[must_use]
    pub fn is_per_file(&self) -> bool {
        match self {
            SyncError::Transfer { .. } => true,
            SyncError::Crypto(e) => e.is_decryption_failure() || matches!(e, CryptoError::Io(_)),
            SyncError::Backend(e) => matches!(
                e,
                BackendError::Transfer(_)
                    | BackendError::NotFound { .. }
                    | BackendError::Http { .. }
                    | BackendError::Io(_)
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_file_classification() {
        assert!(SyncError::Transfer {
            path: "a".into(),
            message: "reset".into()
        }
        .is_per_file());
        assert!(SyncError::from(CryptoError::not_encrypted()).is_per_file());
        assert!(SyncError::from(BackendError::not_found("k")).is_per_file());
        assert!(!SyncError::from(BackendError::NotAuthenticated("x".into())).is_per_file());
        assert!(!SyncError::Cancelled.is_per_file());
        assert!(!SyncError::from(CoreError::NothingToCommit).is_per_file());
    }

    #[test]
    fn inaccessible_message_names_the_target() {
        let err = SyncError::RemoteInaccessible {
            kind: BackendKind::S3,
            target: "bkt".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Amazon S3"));
        assert!(text.contains("bkt"));
        assert!(text.contains("bucket"));
    }
}
