//! The sync engine and the push pass.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::report::{FileOutcome, FileReport, PushSummary, SkipReason};
use crate::session::{open_codec, TempArtifact};
use cairn_backend::{RemoteBackend, RemoteObject, UploadAction};
use cairn_core::{fingerprint_file, matches_checksum, Prompter, Repository};
use cairn_crypto::Codec;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the engine is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No operation running.
    Idle,
    /// Fetching the remote listing.
    Listing,
    /// Uploading files.
    Pushing,
    /// Deciding what to download.
    Planning,
    /// Downloading files.
    Pulling,
    /// The last operation finished.
    Synced,
    /// The last operation aborted.
    Error,
}

impl SyncState {
    /// Returns true while an operation is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::Listing | SyncState::Pushing | SyncState::Planning | SyncState::Pulling
        )
    }
}

/// Reconciles a repository with one remote target.
///
/// The backend is chosen once per command and injected; the engine never
/// knows which store it talks to. Listings are fetched fresh for every
/// operation and treated as a consistent snapshot for its duration.
pub struct SyncEngine {
    pub(crate) repo: Repository,
    pub(crate) backend: Arc<dyn RemoteBackend>,
    pub(crate) target: String,
    pub(crate) prompter: Arc<dyn Prompter>,
    pub(crate) config: SyncConfig,
    state: RwLock<SyncState>,
}

impl SyncEngine {
    /// Creates an engine for `target` on `backend`.
    pub fn new(
        repo: Repository,
        backend: Arc<dyn RemoteBackend>,
        target: impl Into<String>,
        prompter: Arc<dyn Prompter>,
        config: SyncConfig,
    ) -> Self {
        Self {
            repo,
            backend,
            target: target.into(),
            prompter,
            config,
            state: RwLock::new(SyncState::Idle),
        }
    }

    /// The repository being synchronized.
    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// The folder id, bucket or container.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The injected backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn RemoteBackend> {
        &self.backend
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Runs `op`, leaving the state at `Synced` or `Error`.
    pub(crate) async fn tracked<T, F>(&self, op: F) -> SyncResult<T>
    where
        F: std::future::Future<Output = SyncResult<T>>,
    {
        let result = op.await;
        self.set_state(match result {
            Ok(_) => SyncState::Synced,
            Err(_) => SyncState::Error,
        });
        result
    }

    pub(crate) fn temp_dir(&self) -> PathBuf {
        self.config
            .temp_dir
            .clone()
            .unwrap_or_else(|| self.repo.context().temp_dir())
    }

    pub(crate) fn confirm(&self, message: &str, default: bool) -> SyncResult<()> {
        if self.prompter.confirm(message, default)? {
            Ok(())
        } else {
            Err(SyncError::Cancelled)
        }
    }

    pub(crate) async fn ensure_reachable(&self) -> SyncResult<()> {
        if self.backend.check_reachable(&self.target).await {
            Ok(())
        } else {
            Err(SyncError::RemoteInaccessible {
                kind: self.backend.kind(),
                target: self.target.clone(),
            })
        }
    }

    pub(crate) async fn open_codec(&self) -> SyncResult<Option<Codec>> {
        open_codec(&self.repo, self.prompter.as_ref(), &self.config).await
    }

    /// Fetches the listing once and indexes it by key.
    pub(crate) async fn remote_index(&self) -> SyncResult<HashMap<String, RemoteObject>> {
        self.set_state(SyncState::Listing);
        let objects = self.backend.list(&self.target, None).await?;
        Ok(objects.into_iter().map(|o| (o.key.clone(), o)).collect())
    }

    /// Uploads every file of every unpushed commit that differs from the remote.
    ///
    /// Files go one at a time against a single listing, so created/updated
    /// classification is consistent. Per-file failures are counted and do
    /// not stop the pass. Afterwards all previously unpushed commits are
    /// marked pushed in one write.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is unreachable, the listing fails,
    /// the encryption session cannot be opened, or the commit log cannot
    /// be written.
    pub async fn push(&self) -> SyncResult<PushSummary> {
        self.tracked(self.push_inner()).await
    }

    async fn push_inner(&self) -> SyncResult<PushSummary> {
        let unpushed = self.repo.unpushed_commits();
        if unpushed.is_empty() {
            tracing::info!("nothing to push");
            return Ok(PushSummary::default());
        }

        self.ensure_reachable().await?;
        let codec = self.open_codec().await?;
        let remote = self.remote_index().await?;

        let mut seen = HashSet::new();
        let paths: Vec<String> = unpushed
            .iter()
            .flat_map(|c| c.files.iter().map(|f| f.path.clone()))
            .filter(|p| seen.insert(p.clone()))
            .collect();
        tracing::info!(
            commits = unpushed.len(),
            files = paths.len(),
            target = %self.target,
            "pushing"
        );

        self.set_state(SyncState::Pushing);
        let mut summary = PushSummary::default();
        for path in &paths {
            let report = self
                .push_file(path, remote.get(path), codec.as_ref())
                .await;
            summary.record(report);
        }

        let ids: Vec<String> = unpushed.into_iter().map(|c| c.id).collect();
        summary.commits = self.repo.mark_pushed(&ids, Utc::now())?;
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "push complete"
        );
        Ok(summary)
    }

    /// Marks every commit unpushed after confirmation, then pushes.
    ///
    /// Files whose fingerprint matches the remote are still skipped, so
    /// the replay only transfers what differs.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] if the user declines, otherwise as
    /// [`SyncEngine::push`].
    pub async fn force_push(&self) -> SyncResult<PushSummary> {
        self.confirm(
            "Force push will re-check ALL committed files against the remote. Continue?",
            false,
        )?;
        let reset = self.repo.reset_pushed()?;
        tracing::info!(reset, "commits marked unpushed");
        self.push().await
    }

    /// Fingerprint-checks one file and uploads it if it differs.
    pub(crate) async fn push_file(
        &self,
        path: &str,
        remote: Option<&RemoteObject>,
        codec: Option<&Codec>,
    ) -> FileReport {
        let local = self.repo.context().local_path(path);
        if !local.is_file() {
            return FileReport::skipped(path, SkipReason::LocalMissing);
        }

        let hash = match fingerprint_file(&local).await {
            Ok(hash) => hash,
            Err(err) => {
                tracing::warn!(path, error = %err, "cannot read file");
                return FileReport::failed(path, err.to_string());
            }
        };
        if matches_checksum(&hash, remote.and_then(|r| r.checksum.as_deref())) {
            return FileReport::skipped(path, SkipReason::UpToDate);
        }

        match self.upload_one(&local, path, codec).await {
            Ok((action, bytes)) => FileReport::new(path, FileOutcome::from(action)).with_bytes(bytes),
            Err(err) => {
                tracing::warn!(path, error = %err, "upload failed");
                FileReport::failed(path, err.to_string())
            }
        }
    }

    /// Uploads `local` to `key`, through an encrypted temporary copy when
    /// a codec is active. Returns the action and the bytes sent.
    pub(crate) async fn upload_one(
        &self,
        local: &Path,
        key: &str,
        codec: Option<&Codec>,
    ) -> SyncResult<(UploadAction, u64)> {
        match codec {
            Some(codec) => {
                let artifact = TempArtifact::new(&self.temp_dir(), "upload").await.map_err(|e| {
                    SyncError::Transfer {
                        path: key.to_string(),
                        message: format!("cannot create temporary file: {e}"),
                    }
                })?;
                let bytes = codec.encrypt_file(local, artifact.path()).await?;
                let action = self.backend.upload(artifact.path(), key, &self.target).await?;
                Ok((action, bytes))
            }
            None => {
                let bytes = tokio::fs::metadata(local)
                    .await
                    .map_err(|e| SyncError::Transfer {
                        path: key.to_string(),
                        message: e.to_string(),
                    })?
                    .len();
                let action = self.backend.upload(local, key, &self.target).await?;
                Ok((action, bytes))
            }
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("kind", &self.backend.kind())
            .field("target", &self.target)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
