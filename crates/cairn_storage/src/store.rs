//! The state store trait and its typed helpers.

use crate::error::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Where a document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Inside the repository's `.cairn` directory.
    Repository,
    /// Inside the per-user `.cairn` directory.
    Global,
}

/// The documents the system persists.
///
/// The first four belong to a repository; the rest are shared by every
/// repository of the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    /// Remote identifiers, encryption flag and creation metadata.
    Config,
    /// Paths pending commit.
    Stage,
    /// The commit log.
    Commits,
    /// Descriptor of the remote a repository was cloned from or linked to.
    Remote,
    /// User preferences.
    Settings,
    /// Key derivation parameters.
    Vault,
    /// Stored OAuth access token.
    Token,
    /// Stored client credentials.
    Credentials,
}

impl Document {
    /// Every document, repository scope first.
    pub const ALL: [Document; 8] = [
        Document::Config,
        Document::Stage,
        Document::Commits,
        Document::Remote,
        Document::Settings,
        Document::Vault,
        Document::Token,
        Document::Credentials,
    ];

    /// File name used on disk.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Document::Config => "config.json",
            Document::Stage => "stage.json",
            Document::Commits => "commits.json",
            Document::Remote => "remote.json",
            Document::Settings => "settings.json",
            Document::Vault => "vault.json",
            Document::Token => "token.json",
            Document::Credentials => "credentials.json",
        }
    }

    /// The directory the document belongs to.
    #[must_use]
    pub fn scope(self) -> Scope {
        match self {
            Document::Config | Document::Stage | Document::Commits | Document::Remote => {
                Scope::Repository
            }
            Document::Settings | Document::Vault | Document::Token | Document::Credentials => {
                Scope::Global
            }
        }
    }
}

/// Raw persistence of state documents.
///
/// Implementations store opaque bytes per [`Document`]. A write must replace
/// the previous content atomically: a reader sees either the old bytes or the
/// new bytes, never a mix or a truncated file.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Callers are single-writer; no
/// cross-process locking is provided.
pub trait StateStore: Send + Sync {
    /// Reads the raw bytes of a document, or `None` if it has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    fn read_raw(&self, document: Document) -> StorageResult<Option<Vec<u8>>>;

    /// Atomically replaces the bytes of a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the replace fails. The previous
    /// content is left intact in that case.
    fn write_raw(&self, document: Document, data: &[u8]) -> StorageResult<()>;

    /// Deletes a document. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be removed.
    fn remove(&self, document: Document) -> StorageResult<bool>;

    /// Returns `true` if the document has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the presence check itself fails.
    fn exists(&self, document: Document) -> StorageResult<bool> {
        Ok(self.read_raw(document)?.is_some())
    }
}

/// Typed access on top of any [`StateStore`].
pub trait StateStoreExt: StateStore {
    /// Reads and decodes a document.
    ///
    /// Returns `Ok(None)` when the document is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if the bytes do not parse.
    fn read<T: DeserializeOwned>(&self, document: Document) -> StorageResult<Option<T>> {
        match self.read_raw(document)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Corrupted {
                    document: document.file_name(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Reads a document, falling back to `T::default()` when it is missing,
    /// unreadable or corrupted.
    fn read_or_default<T: DeserializeOwned + Default>(&self, document: Document) -> T {
        match self.read(document) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(
                    document = document.file_name(),
                    error = %e,
                    "falling back to default document"
                );
                T::default()
            }
        }
    }

    /// Encodes and atomically writes a document.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the atomic replace fails.
    fn write<T: Serialize + ?Sized>(&self, document: Document, value: &T) -> StorageResult<()> {
        let data = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Encode {
            document: document.file_name(),
            source,
        })?;
        self.write_raw(document, &data)
    }
}

impl<S: StateStore + ?Sized> StateStoreExt for S {}
