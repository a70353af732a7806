//! In-memory state store for testing.

use crate::error::StorageResult;
use crate::store::{Document, StateStore};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A state store that keeps documents in memory.
///
/// Writes are trivially atomic. Useful for unit tests that exercise the
/// staging logic without touching the file system.
///
/// # Example
///
/// ```rust
/// use cairn_storage::{Document, InMemoryStateStore, StateStoreExt};
///
/// let store = InMemoryStateStore::new();
/// store.write(Document::Stage, &vec!["a.txt"]).unwrap();
/// let stage: Vec<String> = store.read_or_default(Document::Stage);
/// assert_eq!(stage, vec!["a.txt"]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    documents: RwLock<HashMap<Document, Vec<u8>>>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a document with arbitrary bytes, bypassing encoding.
    ///
    /// Useful for simulating corrupted documents.
    pub fn insert_raw(&self, document: Document, data: Vec<u8>) {
        self.documents.write().insert(document, data);
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn read_raw(&self, document: Document) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.documents.read().get(&document).cloned())
    }

    fn write_raw(&self, document: Document, data: &[u8]) -> StorageResult<()> {
        self.documents.write().insert(document, data.to_vec());
        Ok(())
    }

    fn remove(&self, document: Document) -> StorageResult<bool> {
        Ok(self.documents.write().remove(&document).is_some())
    }
}
