//! Process-level wiring: paths, prompts, credentials, engines.

use crate::credentials::StoredCredentials;
use crate::error::{CliError, CliResult};
use crate::prompt::TerminalPrompter;
use cairn_backend::{connect, resolve_target, RemoteBackend};
use cairn_core::{BackendKind, Prompter, RepoContext, Repository, Settings};
use cairn_storage::{Document, FileStateStore, StateStore, StateStoreExt};
use cairn_sync::{SyncConfig, SyncEngine};
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the encryption passphrase.
pub const PASSPHRASE_VAR: &str = "CAIRN_PASSPHRASE";

/// Everything a command needs from the outside world.
pub struct App {
    ctx: RepoContext,
    prompter: Arc<dyn Prompter>,
    verbose: bool,
}

impl App {
    /// Builds the context from `--root` (or the working directory) and the
    /// user's home directory.
    pub fn from_env(root: Option<PathBuf>) -> CliResult<Self> {
        let root = match root {
            Some(root) => std::path::absolute(root)?,
            None => std::env::current_dir()?,
        };
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::usage("cannot determine the home directory"))?;
        Ok(Self {
            ctx: RepoContext::new(root, home),
            prompter: Arc::new(TerminalPrompter::new()),
            verbose: false,
        })
    }

    /// Sets whether summaries list every file.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Whether summaries list every file.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// The root and home directories.
    pub fn context(&self) -> &RepoContext {
        &self.ctx
    }

    /// The terminal prompter.
    pub fn prompter(&self) -> &Arc<dyn Prompter> {
        &self.prompter
    }

    /// State store for the global documents; usable without a repository.
    pub fn global_store(&self) -> Arc<dyn StateStore> {
        Arc::new(FileStateStore::new(
            &self.ctx.repo_dir(),
            &self.ctx.global_dir(),
        ))
    }

    /// User preferences, defaults if unset.
    pub fn settings(&self) -> Settings {
        self.global_store()
            .read_or_default::<Settings>(Document::Settings)
    }

    /// Opens the repository at the root.
    pub fn open(&self) -> CliResult<Repository> {
        Ok(Repository::open(self.ctx.clone())?)
    }

    /// Engine settings: temp directory under home, passphrase from the environment.
    pub fn sync_config(&self) -> SyncConfig {
        let config = SyncConfig::new().with_temp_dir(self.ctx.temp_dir());
        match std::env::var(PASSPHRASE_VAR) {
            Ok(passphrase) if !passphrase.is_empty() => config.with_passphrase(passphrase),
            _ => config,
        }
    }

    /// Connects to a store with the stored credentials.
    pub async fn backend(&self, kind: BackendKind) -> CliResult<Arc<dyn RemoteBackend>> {
        let provider = StoredCredentials::new(self.global_store());
        Ok(connect(kind, &provider).await?)
    }

    /// Opens the repository, resolves the target and builds an engine.
    pub async fn engine(&self, kind: BackendKind, target: Option<&str>) -> CliResult<SyncEngine> {
        let repo = self.open()?;
        let target = resolve_target(target, kind, &repo, self.prompter.as_ref())?;
        let backend = self.backend(kind).await?;
        Ok(SyncEngine::new(
            repo,
            backend,
            target,
            self.prompter.clone(),
            self.sync_config(),
        ))
    }
}
