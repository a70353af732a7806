//! The uniform backend contract.

use crate::error::{BackendError, BackendResult};
use crate::object::{RemoteObject, TargetInfo, UploadAction};
use async_trait::async_trait;
use cairn_core::BackendKind;
use std::path::Path;

/// One remote object store.
///
/// Implementors supply the low-level calls. The provided methods build the
/// contract callers rely on: reachability never errors, `upload` reports
/// whether the key existed, `download` and `delete` return `false` instead
/// of failing so batch callers can count failures.
///
/// A target is a folder id, a bucket or a container, depending on
/// [`RemoteBackend::kind`]. Keys always use forward slashes.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Which store this adapter talks to.
    fn kind(&self) -> BackendKind;

    /// Checks that `target` exists and is accessible.
    async fn probe(&self, target: &str) -> BackendResult<()>;

    /// Lists objects under `target`, optionally limited to keys starting
    /// with `prefix`. Pagination is fully drained.
    async fn list(&self, target: &str, prefix: Option<&str>) -> BackendResult<Vec<RemoteObject>>;

    /// Returns `true` if `key` exists in `target`.
    async fn exists(&self, target: &str, key: &str) -> BackendResult<bool>;

    /// Writes the contents of `local` under `key`, replacing any existing object.
    async fn put(&self, local: &Path, key: &str, target: &str) -> BackendResult<()>;

    /// Streams `key` into `dest`. The parent directory must exist.
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, target: &str, key: &str, dest: &Path) -> BackendResult<u64>;

    /// Removes `key` from `target`.
    async fn remove_object(&self, target: &str, key: &str) -> BackendResult<()>;

    /// Display metadata for `target`, if the store has any.
    async fn describe_target(&self, _target: &str) -> BackendResult<Option<TargetInfo>> {
        Ok(None)
    }

    /// Creates a new target named `name`.
    async fn create_target(&self, name: &str) -> BackendResult<TargetInfo> {
        Err(BackendError::Unsupported(format!(
            "{} cannot create `{name}`",
            self.kind().label()
        )))
    }

    /// Existence and permission probe. Never fails.
    async fn check_reachable(&self, target: &str) -> bool {
        match self.probe(target).await {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(kind = %self.kind(), target, error = %err, "target unreachable");
                false
            }
        }
    }

    /// Uploads `local` to `key`, reporting whether the key already existed.
    async fn upload(&self, local: &Path, key: &str, target: &str) -> BackendResult<UploadAction> {
        let existed = self.exists(target, key).await?;
        self.put(local, key, target).await?;
        let action = if existed {
            UploadAction::Updated
        } else {
            UploadAction::Created
        };
        tracing::debug!(kind = %self.kind(), key, ?action, "uploaded");
        Ok(action)
    }

    /// Creates missing parent directories of `dest`, then fetches `key` into it.
    async fn download_to(&self, target: &str, key: &str, dest: &Path) -> BackendResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.fetch(target, key, dest).await
    }

    /// Downloads `key` into `dest`; `false` on any failure.
    async fn download(&self, target: &str, key: &str, dest: &Path) -> bool {
        match self.download_to(target, key, dest).await {
            Ok(bytes) => {
                tracing::debug!(kind = %self.kind(), key, bytes, "downloaded");
                true
            }
            Err(err) => {
                tracing::warn!(kind = %self.kind(), key, error = %err, "download failed");
                false
            }
        }
    }

    /// Deletes `key`; `false` on any failure.
    async fn delete(&self, target: &str, key: &str) -> bool {
        match self.remove_object(target, key).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(kind = %self.kind(), key, error = %err, "delete failed");
                false
            }
        }
    }
}
