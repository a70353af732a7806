//! The pull pass: plan sequentially, then download in parallel windows.

use crate::engine::{SyncEngine, SyncState};
use crate::error::{SyncError, SyncResult};
use crate::report::{FileOutcome, FileReport, PullSummary, SkipReason};
use crate::session::TempArtifact;
use cairn_backend::{key_to_local, RemoteObject};
use cairn_core::{fingerprint_file, matches_checksum, ConflictPolicy};
use cairn_crypto::{is_encrypted_file, Codec};
use futures::future::join_all;
use std::path::{Path, PathBuf};

/// Options for [`SyncEngine::pull`].
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Skip the overwrite confirmation.
    pub force: bool,
    /// Report what would be pulled without writing anything.
    pub dry_run: bool,
    /// How to treat files that differ locally.
    pub policy: ConflictPolicy,
    /// Only pull these keys. Empty means everything.
    pub files: Vec<String>,
}

impl PullOptions {
    /// Default options: confirm, ask on conflicts, pull everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the confirmation.
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Only plans.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the conflict policy.
    #[must_use]
    pub fn policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Restricts the pull to the given keys.
    #[must_use]
    pub fn files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }
}

/// A download decided during planning.
#[derive(Debug)]
pub(crate) struct PlannedDownload {
    pub(crate) key: String,
    pub(crate) dest: PathBuf,
}

const CONFLICT_CHOICES: [&str; 4] = [
    "Keep local",
    "Take remote",
    "Keep local for all remaining",
    "Take remote for all remaining",
];

impl SyncEngine {
    /// Brings remote objects into the working tree.
    ///
    /// Missing files are always downloaded and matching files always
    /// skipped. Differing files follow `options.policy`; with
    /// [`ConflictPolicy::Ask`] every question is answered before the first
    /// byte moves, so downloads can run in parallel windows regardless.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] if the confirmation is declined,
    /// a validation error if none of `options.files` exist remotely, or a
    /// setup error. Per-file failures are counted in the summary.
    pub async fn pull(&self, options: PullOptions) -> SyncResult<PullSummary> {
        self.tracked(self.pull_inner(options)).await
    }

    async fn pull_inner(&self, options: PullOptions) -> SyncResult<PullSummary> {
        if !options.force && !options.dry_run {
            self.confirm("This may overwrite local files. Continue?", false)?;
        }
        self.ensure_reachable().await?;

        self.set_state(SyncState::Listing);
        let mut objects = self.backend.list(&self.target, None).await?;
        if !options.files.is_empty() {
            objects.retain(|o| options.files.iter().any(|f| f == &o.key));
            if objects.is_empty() {
                return Err(SyncError::validation(
                    "none of the requested files were found in the remote",
                ));
            }
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        if objects.is_empty() {
            tracing::info!(target = %self.target, "remote is empty");
            return Ok(PullSummary::default());
        }
        if options.dry_run {
            return Ok(PullSummary {
                planned: objects,
                ..PullSummary::default()
            });
        }

        let codec = self.open_codec().await?;
        self.set_state(SyncState::Planning);
        let (downloads, mut summary) = self.plan(&objects, options.policy).await?;
        self.set_state(SyncState::Pulling);
        for report in self.execute(downloads, codec.as_ref()).await {
            summary.record(report);
        }
        summary.files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "pull complete"
        );
        Ok(summary)
    }

    /// Decides each object's fate. Prompts run here, one at a time.
    ///
    /// Keys the ignore rules match, repository state included, are never
    /// planned for download.
    pub(crate) async fn plan(
        &self,
        objects: &[RemoteObject],
        policy: ConflictPolicy,
    ) -> SyncResult<(Vec<PlannedDownload>, PullSummary)> {
        let root = self.repo.context().root().to_path_buf();
        let mut policy = policy;
        let mut downloads = Vec::new();
        let mut summary = PullSummary::default();

        for object in objects {
            if self.repo.enumerator().is_ignored(&object.key) {
                tracing::warn!(key = %object.key, "skipping ignored remote key");
                summary.record(FileReport::skipped(&object.key, SkipReason::Ignored));
                continue;
            }
            let dest = match key_to_local(&root, &object.key) {
                Ok(dest) => dest,
                Err(err) => {
                    tracing::warn!(key = %object.key, error = %err, "refusing remote key");
                    summary.record(FileReport::failed(&object.key, err.to_string()));
                    continue;
                }
            };
            if !dest.exists() {
                downloads.push(PlannedDownload {
                    key: object.key.clone(),
                    dest,
                });
                continue;
            }

            let hash = match fingerprint_file(&dest).await {
                Ok(hash) => hash,
                Err(err) => {
                    summary.record(FileReport::failed(&object.key, err.to_string()));
                    continue;
                }
            };
            if matches_checksum(&hash, object.checksum.as_deref()) {
                summary.record(FileReport::skipped(&object.key, SkipReason::UpToDate));
                continue;
            }

            let take_remote = match policy {
                ConflictPolicy::KeepLocal => false,
                ConflictPolicy::TakeRemote => true,
                ConflictPolicy::Ask => {
                    let choice = self.prompter.select(
                        &format!("{} differs from the remote copy", object.key),
                        &CONFLICT_CHOICES,
                        0,
                    )?;
                    match choice {
                        0 => false,
                        1 => true,
                        2 => {
                            policy = ConflictPolicy::KeepLocal;
                            false
                        }
                        _ => {
                            policy = ConflictPolicy::TakeRemote;
                            true
                        }
                    }
                }
            };
            if take_remote {
                downloads.push(PlannedDownload {
                    key: object.key.clone(),
                    dest,
                });
            } else {
                summary.record(FileReport::skipped(&object.key, SkipReason::KeptLocal));
            }
        }
        Ok((downloads, summary))
    }

    /// Runs planned downloads in windows of `concurrency_window`.
    pub(crate) async fn execute(
        &self,
        downloads: Vec<PlannedDownload>,
        codec: Option<&Codec>,
    ) -> Vec<FileReport> {
        let mut reports = Vec::with_capacity(downloads.len());
        for window in downloads.chunks(self.config.concurrency_window.max(1)) {
            let results = join_all(
                window
                    .iter()
                    .map(|d| self.download_one(&d.key, &d.dest, codec)),
            )
            .await;
            for (planned, result) in window.iter().zip(results) {
                reports.push(match result {
                    Ok(bytes) => FileReport::new(&planned.key, FileOutcome::Downloaded).with_bytes(bytes),
                    Err(err) => {
                        tracing::warn!(key = %planned.key, error = %err, "download failed");
                        FileReport::failed(&planned.key, err.to_string())
                    }
                });
            }
        }
        reports
    }

    /// Downloads one object into `dest`, decrypting when it carries the
    /// magic header and a codec is active.
    pub(crate) async fn download_one(
        &self,
        key: &str,
        dest: &Path,
        codec: Option<&Codec>,
    ) -> SyncResult<u64> {
        let Some(codec) = codec else {
            return Ok(self.backend.download_to(&self.target, key, dest).await?);
        };

        let artifact = TempArtifact::new(&self.temp_dir(), "download")
            .await
            .map_err(|e| SyncError::Transfer {
                path: key.to_string(),
                message: format!("cannot create temporary file: {e}"),
            })?;
        self.backend
            .download_to(&self.target, key, artifact.path())
            .await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::Transfer {
                    path: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        if is_encrypted_file(artifact.path()).await {
            Ok(codec.decrypt_file(artifact.path(), dest).await?)
        } else {
            tracing::warn!(key, "remote object is not encrypted; copying as plain text");
            tokio::fs::copy(artifact.path(), dest)
                .await
                .map_err(|e| SyncError::Transfer {
                    path: key.to_string(),
                    message: e.to_string(),
                })
        }
    }
}
