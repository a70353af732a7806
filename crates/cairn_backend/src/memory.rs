//! In-process backend for tests.

use crate::backend::RemoteBackend;
use crate::error::{BackendError, BackendResult};
use crate::object::{validate_key, RemoteObject, TargetInfo};
use async_trait::async_trait;
use bytes::Bytes;
use cairn_core::{fingerprint, BackendKind};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    modified: DateTime<Utc>,
}

/// A backend that keeps objects in memory.
///
/// Targets must be created (or inserted into) before use. Checksums are
/// MD5, like the real stores. Counters and injectable failures let tests
/// observe what the sync engine did.
#[derive(Debug)]
pub struct MemoryBackend {
    kind: BackendKind,
    targets: RwLock<HashMap<String, BTreeMap<String, StoredObject>>>,
    failing: RwLock<HashSet<String>>,
    uploads: AtomicUsize,
    downloads: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryBackend {
    /// Creates an empty backend reporting `kind`.
    #[must_use]
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            targets: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            uploads: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Creates a backend with one empty target.
    #[must_use]
    pub fn with_target(kind: BackendKind, target: &str) -> Self {
        let backend = Self::new(kind);
        backend.add_target(target);
        backend
    }

    /// Makes `target` exist.
    pub fn add_target(&self, target: &str) {
        self.targets.write().entry(target.to_string()).or_default();
    }

    /// Stores an object directly, creating the target if needed.
    pub fn insert(&self, target: &str, key: &str, data: impl Into<Bytes>) {
        self.targets.write().entry(target.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                modified: Utc::now(),
            },
        );
    }

    /// Returns the bytes stored under `key`.
    #[must_use]
    pub fn get(&self, target: &str, key: &str) -> Option<Bytes> {
        self.targets
            .read()
            .get(target)
            .and_then(|objects| objects.get(key))
            .map(|o| o.data.clone())
    }

    /// All keys in `target`, sorted.
    #[must_use]
    pub fn keys(&self, target: &str) -> Vec<String> {
        self.targets
            .read()
            .get(target)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Makes every transfer of `key` fail.
    pub fn fail_key(&self, key: &str) {
        self.failing.write().insert(key.to_string());
    }

    /// Number of successful uploads.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Number of successful downloads.
    #[must_use]
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of successful deletes.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_failure(&self, key: &str) -> BackendResult<()> {
        if self.failing.read().contains(key) {
            return Err(BackendError::transfer(format!("injected failure for `{key}`")));
        }
        Ok(())
    }

    fn missing_target(target: &str) -> BackendError {
        BackendError::not_found(target)
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn probe(&self, target: &str) -> BackendResult<()> {
        if self.targets.read().contains_key(target) {
            Ok(())
        } else {
            Err(Self::missing_target(target))
        }
    }

    async fn list(&self, target: &str, prefix: Option<&str>) -> BackendResult<Vec<RemoteObject>> {
        let targets = self.targets.read();
        let objects = targets
            .get(target)
            .ok_or_else(|| Self::missing_target(target))?;
        Ok(objects
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |p| key.starts_with(p)))
            .map(|(key, object)| RemoteObject {
                key: key.clone(),
                checksum: Some(fingerprint(&object.data)),
                size: object.data.len() as u64,
                last_modified: Some(object.modified),
            })
            .collect())
    }

    async fn exists(&self, target: &str, key: &str) -> BackendResult<bool> {
        let targets = self.targets.read();
        let objects = targets
            .get(target)
            .ok_or_else(|| Self::missing_target(target))?;
        Ok(objects.contains_key(key))
    }

    async fn put(&self, local: &Path, key: &str, target: &str) -> BackendResult<()> {
        validate_key(key)?;
        self.check_failure(key)?;
        let data = tokio::fs::read(local).await?;
        let mut targets = self.targets.write();
        let objects = targets
            .get_mut(target)
            .ok_or_else(|| Self::missing_target(target))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data: Bytes::from(data),
                modified: Utc::now(),
            },
        );
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch(&self, target: &str, key: &str, dest: &Path) -> BackendResult<u64> {
        self.check_failure(key)?;
        let data = {
            let targets = self.targets.read();
            let objects = targets
                .get(target)
                .ok_or_else(|| Self::missing_target(target))?;
            objects
                .get(key)
                .map(|o| o.data.clone())
                .ok_or_else(|| BackendError::not_found(key))?
        };
        crate::transfer::save_reader(&data[..], dest).await?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(data.len() as u64)
    }

    async fn remove_object(&self, target: &str, key: &str) -> BackendResult<()> {
        self.check_failure(key)?;
        let mut targets = self.targets.write();
        let objects = targets
            .get_mut(target)
            .ok_or_else(|| Self::missing_target(target))?;
        objects
            .remove(key)
            .ok_or_else(|| BackendError::not_found(key))?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn describe_target(&self, target: &str) -> BackendResult<Option<TargetInfo>> {
        self.probe(target).await?;
        Ok(Some(TargetInfo {
            id: target.to_string(),
            name: target.to_string(),
            url: Some(format!("memory://{target}")),
        }))
    }

    async fn create_target(&self, name: &str) -> BackendResult<TargetInfo> {
        self.add_target(name);
        Ok(TargetInfo {
            id: name.to_string(),
            name: name.to_string(),
            url: Some(format!("memory://{name}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::UploadAction;
    use tempfile::tempdir;

    #[tokio::test]
    async fn upload_reports_created_then_updated() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("a.txt");
        std::fs::write(&local, b"hello").unwrap();
        let backend = MemoryBackend::with_target(BackendKind::S3, "bkt");

        let first = backend.upload(&local, "docs/a.txt", "bkt").await.unwrap();
        let second = backend.upload(&local, "docs/a.txt", "bkt").await.unwrap();
        assert_eq!(first, UploadAction::Created);
        assert_eq!(second, UploadAction::Updated);
        assert_eq!(backend.upload_count(), 2);

        let listing = backend.list("bkt", Some("docs/")).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(
            listing[0].checksum.as_deref(),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
        assert!(backend.list("bkt", Some("other/")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_creates_parents_and_reports_failure_as_false() {
        let dir = tempdir().unwrap();
        let backend = MemoryBackend::with_target(BackendKind::Gcs, "bkt");
        backend.insert("bkt", "deep/nested/c.txt", &b"remote"[..]);

        let dest = dir.path().join("deep/nested/c.txt");
        assert!(backend.download("bkt", "deep/nested/c.txt", &dest).await);
        assert_eq!(std::fs::read(&dest).unwrap(), b"remote");

        assert!(!backend.download("bkt", "missing.txt", &dir.path().join("m")).await);
        assert!(!dir.path().join("m").exists());
    }

    #[tokio::test]
    async fn reachability_and_delete_never_error() {
        let backend = MemoryBackend::with_target(BackendKind::Azure, "box");
        backend.insert("box", "x", &b"1"[..]);
        assert!(backend.check_reachable("box").await);
        assert!(!backend.check_reachable("nope").await);
        assert!(backend.delete("box", "x").await);
        assert!(!backend.delete("box", "x").await);
        assert_eq!(backend.delete_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_transfer_errors() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("f");
        std::fs::write(&local, b"x").unwrap();
        let backend = MemoryBackend::with_target(BackendKind::S3, "bkt");
        backend.fail_key("f");
        assert!(matches!(
            backend.upload(&local, "f", "bkt").await,
            Err(BackendError::Transfer(_))
        ));
        assert!(backend.keys("bkt").is_empty());
    }

    #[tokio::test]
    async fn default_create_target_is_unsupported_for_other_adapters() {
        struct Bare;
        #[async_trait]
        impl RemoteBackend for Bare {
            fn kind(&self) -> BackendKind {
                BackendKind::S3
            }
            async fn probe(&self, _: &str) -> BackendResult<()> {
                Ok(())
            }
            async fn list(&self, _: &str, _: Option<&str>) -> BackendResult<Vec<RemoteObject>> {
                Ok(Vec::new())
            }
            async fn exists(&self, _: &str, _: &str) -> BackendResult<bool> {
                Ok(false)
            }
            async fn put(&self, _: &Path, _: &str, _: &str) -> BackendResult<()> {
                Ok(())
            }
            async fn fetch(&self, _: &str, _: &str, _: &Path) -> BackendResult<u64> {
                Ok(0)
            }
            async fn remove_object(&self, _: &str, _: &str) -> BackendResult<()> {
                Ok(())
            }
        }
        assert!(matches!(
            Bare.create_target("x").await,
            Err(BackendError::Unsupported(_))
        ));
        assert_eq!(Bare.describe_target("x").await.unwrap(), None);
    }
}
