//! Error type for the command-line interface.

use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Repository or staging error.
    #[error(transparent)]
    Core(#[from] cairn_core::CoreError),

    /// State document error.
    #[error(transparent)]
    Storage(#[from] cairn_storage::StorageError),

    /// Remote store error.
    #[error(transparent)]
    Backend(#[from] cairn_backend::BackendError),

    /// Sync engine error.
    #[error(transparent)]
    Sync(#[from] cairn_sync::SyncError),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad arguments or environment.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Creates a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Returns `true` if the user declined a confirmation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CliError::Sync(cairn_sync::SyncError::Cancelled))
    }
}
