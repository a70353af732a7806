//! Error types for cairn core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in repository and staging operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// State store error.
    #[error("storage error: {0}")]
    Storage(#[from] cairn_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The working directory has no repository.
    #[error("not a cairn repository: {} (run `cairn init` first)", path.display())]
    NotARepository {
        /// Directory that was searched.
        path: PathBuf,
    },

    /// A repository already exists where one was to be created.
    #[error("repository already exists at {}", path.display())]
    AlreadyARepository {
        /// The existing repository directory.
        path: PathBuf,
    },

    /// Commit was requested with an empty stage.
    #[error("nothing to commit (stage files with `cairn add <files>`)")]
    NothingToCommit,

    /// The commit log is empty.
    #[error("no commits yet")]
    NoCommits,

    /// The most recent commit has already been pushed.
    #[error("cannot amend commit {id}: it has already been pushed")]
    AmendRejected {
        /// Id of the pushed commit.
        id: String,
    },

    /// Required input is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An interactive prompt could not be completed.
    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
