//! File-based state store.

use crate::error::StorageResult;
use crate::store::{Document, Scope, StateStore};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const TEMP_SUFFIX: &str = ".tmp";

/// A state store backed by JSON files in two directories.
///
/// Repository documents live in `repo_dir`, per-user documents in
/// `global_dir`. Both directories are created on first write.
///
/// # Durability
///
/// Every write goes to `<name>.tmp`, is synced with `File::sync_all()`, and
/// is then renamed over the target. On Unix the containing directory is
/// synced afterwards so the rename itself survives a crash.
///
/// # Example
///
/// ```no_run
/// use cairn_storage::{Document, FileStateStore, StateStoreExt};
/// use std::path::Path;
///
/// let store = FileStateStore::new(Path::new("work/.cairn"), Path::new("/home/me/.cairn"));
/// let stage: Vec<String> = store.read_or_default(Document::Stage);
/// store.write(Document::Stage, &stage).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    repo_dir: PathBuf,
    global_dir: PathBuf,
}

impl FileStateStore {
    /// Creates a store over the given repository and global directories.
    #[must_use]
    pub fn new(repo_dir: &Path, global_dir: &Path) -> Self {
        Self {
            repo_dir: repo_dir.to_path_buf(),
            global_dir: global_dir.to_path_buf(),
        }
    }

    /// Returns the repository directory.
    #[must_use]
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Returns the per-user directory.
    #[must_use]
    pub fn global_dir(&self) -> &Path {
        &self.global_dir
    }

    /// Returns the on-disk path of a document.
    #[must_use]
    pub fn path_of(&self, document: Document) -> PathBuf {
        let dir = match document.scope() {
            Scope::Repository => &self.repo_dir,
            Scope::Global => &self.global_dir,
        };
        dir.join(document.file_name())
    }

    #[cfg(unix)]
    fn sync_directory(dir: &Path) -> io::Result<()> {
        File::open(dir)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_directory(_dir: &Path) -> io::Result<()> {
        Ok(())
    }
}

fn replace_file(temp_path: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

impl StateStore for FileStateStore {
    fn read_raw(&self, document: Document) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(self.path_of(document)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_raw(&self, document: Document, data: &[u8]) -> StorageResult<()> {
        let path = self.path_of(document);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;

        let temp_path = dir.join(format!("{}{TEMP_SUFFIX}", document.file_name()));
        if let Err(e) = replace_file(&temp_path, &path, data) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Self::sync_directory(&dir)?;

        tracing::debug!(document = document.file_name(), bytes = data.len(), "document written");
        Ok(())
    }

    fn remove(&self, document: Document) -> StorageResult<bool> {
        match fs::remove_file(self.path_of(document)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, document: Document) -> StorageResult<bool> {
        Ok(self.path_of(document).is_file())
    }
}
