//! # Cairn Core
//!
//! The repository model and everything that happens before a transfer:
//!
//! - [`RepoContext`] - explicit repository root and user home
//! - [`Repository`] - the four state documents plus the staging lifecycle
//!   (`add`, `remove`, `reset`, `commit`, `amend`)
//! - [`fingerprint`] / [`fingerprint_file`] - content digests used for
//!   change detection
//! - [`IgnoreRules`] and [`PathEnumerator`] - which files the working tree holds
//! - [`Prompter`] - the seam for every interactive decision
//!
//! ## Example
//!
//! ```no_run
//! use cairn_core::{RepoContext, Repository};
//!
//! # async fn run() -> cairn_core::CoreResult<()> {
//! let repo = Repository::init(RepoContext::new("work", "/home/me"))?;
//! repo.add(&["."])?;
//! let commit = repo.commit("first snapshot").await?;
//! println!("{} files in {}", commit.file_count, commit.id);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod error;
mod fingerprint;
mod ignore;
mod model;
mod prompt;
mod repository;
mod staging;
mod walk;

pub use context::{RepoContext, STATE_DIR};
pub use error::{CoreError, CoreResult};
pub use fingerprint::{fingerprint, fingerprint_file, matches_checksum};
pub use ignore::{IgnoreRules, DEFAULT_IGNORE_PATTERNS, IGNORE_FILE};
pub use model::{
    BackendKind, Commit, ConflictPolicy, FileSnapshot, RemoteInfo, RepoConfig, Settings,
};
pub use prompt::{Answer, Prompter, ScriptedPrompter};
pub use repository::Repository;
pub use staging::{
    StageOutcome, StageSet, StagedEntry, StatusReport, UnstageOutcome, ALL_PATHS,
};
pub use walk::{PathEnumerator, WalkdirEnumerator};
