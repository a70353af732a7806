//! # Cairn Sync
//!
//! Reconciles a repository's working tree with one remote target.
//!
//! This crate provides:
//! - Push of committed files, and force push (replay of every commit)
//! - Pull with conflict policies and bounded-parallel downloads
//! - Whole-tree sync in either direction
//! - Clone of a remote into a new repository
//! - Diff of tracked files against the remote
//! - Per-store object commands (list, upload, download, delete)
//!
//! ## Key Invariants
//!
//! - Every transfer decision is re-derived from content fingerprints, so
//!   re-running an interrupted command converges
//! - Push uploads strictly one file at a time against a single listing
//! - Interactive decisions are made before any parallel transfer starts
//! - Per-file failures are counted; only setup failures abort
//! - Temporary encryption artifacts never outlive their transfer

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clone;
mod config;
mod diff;
mod engine;
mod error;
mod objects;
mod pull;
mod report;
mod session;

pub use clone::{clone_repository, create_remote, Cloned};
pub use config::{SyncConfig, DEFAULT_CONCURRENCY_WINDOW};
pub use engine::{SyncEngine, SyncState};
pub use error::{SyncError, SyncResult};
pub use objects::SyncDirection;
pub use pull::PullOptions;
pub use report::{
    DeleteSummary, DiffReport, FileOutcome, FileReport, PullSummary, PushSummary, SkipReason,
    SyncSummary,
};
pub use session::load_or_create_vault;
