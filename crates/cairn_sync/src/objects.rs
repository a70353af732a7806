//! Per-store object commands and whole-tree sync.

use crate::engine::{SyncEngine, SyncState};
use crate::error::{SyncError, SyncResult};
use crate::pull::PullOptions;
use crate::report::{
    DeleteSummary, FileOutcome, FileReport, PullSummary, PushSummary, SkipReason, SyncSummary,
};
use cairn_backend::{key_to_local, validate_key, RemoteObject};
use cairn_core::{ConflictPolicy, RemoteInfo};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which way a whole-tree sync moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncDirection {
    /// Upload the working tree.
    #[default]
    Push,
    /// Download the remote.
    Pull,
}

impl FromStr for SyncDirection {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "push" | "up" | "upload" => Ok(SyncDirection::Push),
            "pull" | "down" | "download" => Ok(SyncDirection::Pull),
            other => Err(SyncError::validation(format!(
                "unknown sync direction `{other}` (expected push or pull)"
            ))),
        }
    }
}

impl SyncEngine {
    /// Lists the target, optionally limited to keys under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is unreachable or the listing fails.
    pub async fn list_remote(&self, prefix: Option<&str>) -> SyncResult<Vec<RemoteObject>> {
        self.tracked(async {
            self.ensure_reachable().await?;
            self.set_state(SyncState::Listing);
            let mut objects = self.backend.list(&self.target, prefix).await?;
            objects.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(objects)
        })
        .await
    }

    /// Uploads the given local paths, one at a time, without touching commits.
    ///
    /// Paths may be absolute or relative to the repository root; the key is
    /// the root-relative form. Missing files and paths outside the root
    /// count as failures.
    ///
    /// # Errors
    ///
    /// Returns an error only for setup failures.
    pub async fn upload_paths<P: AsRef<Path>>(&self, paths: &[P]) -> SyncResult<PushSummary> {
        self.tracked(async {
            self.ensure_reachable().await?;
            let codec = self.open_codec().await?;
            self.set_state(SyncState::Pushing);

            let ctx = self.repo.context();
            let mut summary = PushSummary::default();
            for path in paths {
                let path = path.as_ref();
                let shown = path.display().to_string();
                let Some(key) = ctx.relative_key(path).filter(|k| !k.is_empty()) else {
                    summary.record(FileReport::failed(shown, "path is outside the repository"));
                    continue;
                };
                let local = ctx.local_path(&key);
                if !local.is_file() {
                    summary.record(FileReport::failed(key, "file not found"));
                    continue;
                }
                let report = match self.upload_one(&local, &key, codec.as_ref()).await {
                    Ok((action, bytes)) => {
                        FileReport::new(&key, FileOutcome::from(action)).with_bytes(bytes)
                    }
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "upload failed");
                        FileReport::failed(&key, err.to_string())
                    }
                };
                summary.record(report);
            }
            Ok(summary)
        })
        .await
    }

    /// Downloads the given keys.
    ///
    /// With `out_dir`, each object lands in that directory under its base
    /// name; otherwise it goes to its key's place in the working tree, and
    /// keys the ignore rules match are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only for setup failures.
    pub async fn download_keys(
        &self,
        keys: &[String],
        out_dir: Option<PathBuf>,
    ) -> SyncResult<PullSummary> {
        self.tracked(async {
            self.ensure_reachable().await?;
            let codec = self.open_codec().await?;
            self.set_state(SyncState::Pulling);

            let root = self.repo.context().root().to_path_buf();
            let mut summary = PullSummary::default();
            for key in keys {
                if out_dir.is_none() && self.repo.enumerator().is_ignored(key) {
                    tracing::warn!(key = %key, "skipping ignored remote key");
                    summary.record(FileReport::skipped(key, SkipReason::Ignored));
                    continue;
                }
                let dest = match destination(&root, out_dir.as_deref(), key) {
                    Ok(dest) => dest,
                    Err(err) => {
                        summary.record(FileReport::failed(key, err.to_string()));
                        continue;
                    }
                };
                let report = match self.download_one(key, &dest, codec.as_ref()).await {
                    Ok(bytes) => FileReport::new(key, FileOutcome::Downloaded).with_bytes(bytes),
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "download failed");
                        FileReport::failed(key, err.to_string())
                    }
                };
                summary.record(report);
            }
            Ok(summary)
        })
        .await
    }

    /// Deletes the given keys after one confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] if the confirmation is declined, or
    /// an error if the target is unreachable.
    pub async fn delete_keys(&self, keys: &[String]) -> SyncResult<DeleteSummary> {
        if keys.is_empty() {
            return Ok(DeleteSummary::default());
        }
        self.confirm(
            &format!(
                "Delete {} object(s) from {}? This cannot be undone.",
                keys.len(),
                self.target
            ),
            false,
        )?;
        self.tracked(async {
            self.ensure_reachable().await?;
            let mut summary = DeleteSummary::default();
            for key in keys {
                let report = if self.backend.delete(&self.target, key).await {
                    FileReport::new(key, FileOutcome::Deleted)
                } else {
                    FileReport::failed(key, "delete failed")
                };
                summary.record(report);
            }
            Ok(summary)
        })
        .await
    }

    /// The stored remote descriptor and whether the target answers now.
    ///
    /// # Errors
    ///
    /// Never fails today; reserved for store errors.
    pub async fn remote_info(&self) -> SyncResult<(Option<RemoteInfo>, bool)> {
        let reachable = self.backend.check_reachable(&self.target).await;
        Ok((self.repo.remote(), reachable))
    }

    /// Mirrors the whole working tree up, or the whole remote down.
    ///
    /// Pushing enumerates every non-ignored file rather than commits and
    /// leaves the commit log alone. Pulling overwrites differing files.
    /// Either way there is exactly one confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] if declined, or a setup error.
    pub async fn sync(&self, direction: SyncDirection) -> SyncResult<SyncSummary> {
        match direction {
            SyncDirection::Push => self.sync_up().await.map(SyncSummary::Push),
            SyncDirection::Pull => self.sync_down().await.map(SyncSummary::Pull),
        }
    }

    async fn sync_up(&self) -> SyncResult<PushSummary> {
        let root = self.repo.context().root().to_path_buf();
        let paths = self.repo.enumerator().files(&root, "")?;
        if paths.is_empty() {
            tracing::info!("working tree is empty");
            return Ok(PushSummary::default());
        }
        self.confirm(
            &format!("Upload {} file(s) to {}?", paths.len(), self.target),
            true,
        )?;

        self.tracked(async {
            self.ensure_reachable().await?;
            let codec = self.open_codec().await?;
            let remote = self.remote_index().await?;
            self.set_state(SyncState::Pushing);
            let mut summary = PushSummary::default();
            for path in &paths {
                let report = self.push_file(path, remote.get(path), codec.as_ref()).await;
                summary.record(report);
            }
            Ok(summary)
        })
        .await
    }

    async fn sync_down(&self) -> SyncResult<PullSummary> {
        let objects = self.list_remote(None).await?;
        if objects.is_empty() {
            return Ok(PullSummary::default());
        }
        self.confirm(
            &format!("Download {} object(s) from {}?", objects.len(), self.target),
            true,
        )?;
        self.pull(
            PullOptions::new()
                .force(true)
                .policy(ConflictPolicy::TakeRemote),
        )
        .await
    }
}

fn destination(root: &Path, out_dir: Option<&Path>, key: &str) -> SyncResult<PathBuf> {
    validate_key(key)?;
    match out_dir {
        Some(dir) => {
            let name = key.rsplit('/').next().unwrap_or(key);
            Ok(dir.join(name))
        }
        None => Ok(key_to_local(root, key)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parsing() {
        assert_eq!("push".parse::<SyncDirection>().unwrap(), SyncDirection::Push);
        assert_eq!("Down".parse::<SyncDirection>().unwrap(), SyncDirection::Pull);
        assert!("sideways".parse::<SyncDirection>().is_err());
    }

    #[test]
    fn out_dir_flattens_keys() {
        let root = Path::new("/repo");
        let out = Path::new("/out");
        assert_eq!(
            destination(root, Some(out), "docs/a.txt").unwrap(),
            out.join("a.txt")
        );
        assert_eq!(
            destination(root, None, "docs/a.txt").unwrap(),
            root.join("docs").join("a.txt")
        );
        assert!(destination(root, None, "../escape").is_err());
    }
}
