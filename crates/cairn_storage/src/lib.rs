//! # Cairn Storage
//!
//! Persistence of the small structured documents that make up a cairn
//! repository's state: config, stage, commit log and remote descriptor,
//! plus the per-user settings, vault and credential documents.
//!
//! ## Design Principles
//!
//! - Stores move opaque bytes per [`Document`]; encoding lives in
//!   [`StateStoreExt`]
//! - Every write replaces the document atomically
//! - A missing or corrupted document reads as its default value
//! - Must be `Send + Sync`
//!
//! ## Available Stores
//!
//! - [`FileStateStore`] - JSON files written with temp-then-rename
//! - [`InMemoryStateStore`] - For testing

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStateStore;
pub use memory::InMemoryStateStore;
pub use store::{Document, Scope, StateStore, StateStoreExt};
