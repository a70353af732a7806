//! # Cairn Testkit
//!
//! Test utilities for cairn.
//!
//! This crate provides:
//! - Temporary repositories with a separate home directory
//! - A sync harness wiring an engine to the in-memory backend and a
//!   scripted prompter
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cairn_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn pushes() {
//!     let harness = SyncHarness::new();
//!     harness.workspace.commit_files(&[("a.txt", b"a")], "init").await;
//!     let summary = harness.engine().push().await.unwrap();
//!     assert_eq!(summary.created, 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
