//! Opening, creating and reading a repository.

use crate::context::RepoContext;
use crate::error::{CoreError, CoreResult};
use crate::model::{Commit, RemoteInfo, RepoConfig, Settings};
use crate::staging::StageSet;
use crate::walk::{PathEnumerator, WalkdirEnumerator};
use cairn_storage::{Document, FileStateStore, StateStore, StateStoreExt};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// A working tree with its `.cairn` state.
///
/// All state goes through a [`StateStore`], so every document write is
/// atomic. Cloning is cheap; clones share the store.
#[derive(Clone)]
pub struct Repository {
    ctx: RepoContext,
    store: Arc<dyn StateStore>,
    enumerator: Arc<dyn PathEnumerator>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.ctx.root())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Opens the repository rooted at `ctx.root()`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotARepository`] if there is no `.cairn` directory.
    pub fn open(ctx: RepoContext) -> CoreResult<Self> {
        if !ctx.repo_dir().is_dir() {
            return Err(CoreError::NotARepository {
                path: ctx.root().to_path_buf(),
            });
        }
        let store = FileStateStore::new(&ctx.repo_dir(), &ctx.global_dir());
        let enumerator = WalkdirEnumerator::load(ctx.root())?;
        Ok(Self::with_parts(ctx, Arc::new(store), Arc::new(enumerator)))
    }

    /// Creates a repository named after its root directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyARepository`] if `.cairn` already exists.
    pub fn init(ctx: RepoContext) -> CoreResult<Self> {
        let name = ctx
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".into());
        let config = RepoConfig {
            name,
            ..RepoConfig::default()
        };
        Self::create(ctx, config, None)
    }

    /// Creates a repository with the given config and optional remote descriptor.
    ///
    /// Writes config, an empty stage and an empty commit log. `created_at`
    /// is stamped if unset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyARepository`] if `.cairn` already exists,
    /// or an I/O error if the directory cannot be created.
    pub fn create(ctx: RepoContext, mut config: RepoConfig, remote: Option<RemoteInfo>) -> CoreResult<Self> {
        let repo_dir = ctx.repo_dir();
        if repo_dir.exists() {
            return Err(CoreError::AlreadyARepository { path: repo_dir });
        }
        std::fs::create_dir_all(&repo_dir)?;

        config.created_at.get_or_insert_with(Utc::now);
        let store = FileStateStore::new(&repo_dir, &ctx.global_dir());
        store.write(Document::Config, &config)?;
        store.write(Document::Stage, &StageSet::default())?;
        store.write(Document::Commits, &Vec::<Commit>::new())?;
        if let Some(remote) = &remote {
            store.write(Document::Remote, remote)?;
        }

        tracing::info!(root = %ctx.root().display(), name = %config.name, "repository initialized");
        let enumerator = WalkdirEnumerator::load(ctx.root())?;
        Ok(Self::with_parts(ctx, Arc::new(store), Arc::new(enumerator)))
    }

    /// Assembles a repository from explicit parts.
    ///
    /// No existence check is made; useful for tests with an in-memory store.
    #[must_use]
    pub fn with_parts(
        ctx: RepoContext,
        store: Arc<dyn StateStore>,
        enumerator: Arc<dyn PathEnumerator>,
    ) -> Self {
        Self {
            ctx,
            store,
            enumerator,
        }
    }

    /// The locations this repository operates on.
    #[must_use]
    pub fn context(&self) -> &RepoContext {
        &self.ctx
    }

    /// The underlying state store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// The working-tree enumerator.
    #[must_use]
    pub fn enumerator(&self) -> &dyn PathEnumerator {
        self.enumerator.as_ref()
    }

    /// Current config, or the default if missing or corrupted.
    #[must_use]
    pub fn config(&self) -> RepoConfig {
        self.store.read_or_default(Document::Config)
    }

    /// Replaces the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_config(&self, config: &RepoConfig) -> CoreResult<()> {
        Ok(self.store.write(Document::Config, config)?)
    }

    /// Applies `f` to the config and saves the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_config<F: FnOnce(&mut RepoConfig)>(&self, f: F) -> CoreResult<RepoConfig> {
        let mut config = self.config();
        f(&mut config);
        self.save_config(&config)?;
        Ok(config)
    }

    /// Turns transfer encryption on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_encryption(&self, enabled: bool) -> CoreResult<()> {
        self.update_config(|c| c.encryption = enabled)?;
        tracing::info!(enabled, "encryption setting changed");
        Ok(())
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> StageSet {
        self.store.read_or_default(Document::Stage)
    }

    pub(crate) fn save_stage(&self, stage: &StageSet) -> CoreResult<()> {
        Ok(self.store.write(Document::Stage, stage)?)
    }

    /// The commit log, oldest first.
    #[must_use]
    pub fn commits(&self) -> Vec<Commit> {
        self.store.read_or_default(Document::Commits)
    }

    /// Replaces the commit log.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_commits(&self, commits: &[Commit]) -> CoreResult<()> {
        Ok(self.store.write(Document::Commits, commits)?)
    }

    /// The remote descriptor, if one was recorded.
    #[must_use]
    pub fn remote(&self) -> Option<RemoteInfo> {
        self.store.read_or_default(Document::Remote)
    }

    /// Records the remote descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_remote(&self, remote: &RemoteInfo) -> CoreResult<()> {
        Ok(self.store.write(Document::Remote, remote)?)
    }

    /// Per-user settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.store.read_or_default(Document::Settings)
    }

    /// Replaces the per-user settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_settings(&self, settings: &Settings) -> CoreResult<()> {
        Ok(self.store.write(Document::Settings, settings)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BackendKind;
    use tempfile::tempdir;

    fn ctx(dir: &std::path::Path) -> RepoContext {
        RepoContext::new(dir.join("proj"), dir.join("home"))
    }

    #[test]
    fn open_without_state_dir_fails() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("proj")).unwrap();
        assert!(matches!(
            Repository::open(ctx(dir.path())),
            Err(CoreError::NotARepository { .. })
        ));
    }

    #[test]
    fn init_writes_documents() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("proj")).unwrap();
        let repo = Repository::init(ctx(dir.path())).unwrap();

        let config = repo.config();
        assert_eq!(config.name, "proj");
        assert!(config.created_at.is_some());
        assert!(!config.encryption);
        assert!(repo.stage().is_empty());
        assert!(repo.commits().is_empty());
        assert!(repo.remote().is_none());
        assert!(dir.path().join("proj/.cairn/config.json").is_file());

        assert!(Repository::open(ctx(dir.path())).is_ok());
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempdir().unwrap();
        Repository::init(ctx(dir.path())).unwrap();
        assert!(matches!(
            Repository::init(ctx(dir.path())),
            Err(CoreError::AlreadyARepository { .. })
        ));
    }

    #[test]
    fn config_updates_persist() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(ctx(dir.path())).unwrap();
        repo.update_config(|c| c.set_target(BackendKind::S3, "bucket"))
            .unwrap();
        repo.set_encryption(true).unwrap();

        let reopened = Repository::open(ctx(dir.path())).unwrap();
        assert_eq!(reopened.config().target(BackendKind::S3), Some("bucket"));
        assert!(reopened.config().encryption);
    }

    #[test]
    fn settings_are_global() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(ctx(dir.path())).unwrap();
        let mut settings = repo.settings();
        settings.verbose_logging = true;
        repo.save_settings(&settings).unwrap();
        assert!(dir.path().join("home/.cairn/settings.json").is_file());
    }
}
