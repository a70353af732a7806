//! Temporary repositories.
//!
//! Every workspace gets its own root and home directory inside one
//! [`TempDir`], so global documents never leak between tests.

use cairn_core::{Commit, RepoContext, Repository};
use cairn_crypto::Vault;
use cairn_storage::{Document, StateStoreExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fresh repository with automatic cleanup.
pub struct TestWorkspace {
    /// The repository.
    pub repo: Repository,
    dir: TempDir,
}

impl TestWorkspace {
    /// Initializes a repository at `<tmp>/project` with home `<tmp>/home`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let ctx = RepoContext::new(dir.path().join("project"), dir.path().join("home"));
        let repo = Repository::init(ctx).expect("Failed to init repository");
        Self { repo, dir }
    }

    /// The working tree root.
    pub fn root(&self) -> &Path {
        self.repo.context().root()
    }

    /// The home directory.
    pub fn home(&self) -> &Path {
        self.repo.context().home()
    }

    /// Scratch space outside the repository.
    pub fn scratch(&self) -> PathBuf {
        let path = self.dir.path().join("scratch");
        std::fs::create_dir_all(&path).expect("Failed to create scratch directory");
        path
    }

    /// Writes a root-relative file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.repo.context().local_path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Reads a root-relative file.
    pub fn read(&self, relative: &str) -> Vec<u8> {
        std::fs::read(self.repo.context().local_path(relative)).expect("Failed to read file")
    }

    /// Returns `true` if the root-relative file exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.repo.context().local_path(relative).is_file()
    }

    /// Deletes a root-relative file.
    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.repo.context().local_path(relative))
            .expect("Failed to remove file");
    }

    /// Writes, stages and commits the given files.
    pub async fn commit_files(&self, files: &[(&str, &[u8])], message: &str) -> Commit {
        let paths: Vec<&str> = files
            .iter()
            .map(|(path, contents)| {
                self.write(path, contents);
                *path
            })
            .collect();
        self.repo.add(&paths).expect("Failed to stage files");
        self.repo.commit(message).await.expect("Failed to commit")
    }

    /// Turns on encryption with a deliberately cheap key derivation.
    pub fn enable_encryption(&self) {
        let vault = Vault::generate().with_cost(1, 64);
        self.repo
            .store()
            .write(Document::Vault, &vault)
            .expect("Failed to write vault");
        self.repo
            .set_encryption(true)
            .expect("Failed to enable encryption");
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestWorkspace {
    type Target = Repository;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

/// Runs a test with a temporary repository.
pub fn with_workspace<F, R>(f: F) -> R
where
    F: FnOnce(&TestWorkspace) -> R,
{
    let workspace = TestWorkspace::new();
    f(&workspace)
}
