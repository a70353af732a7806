//! Remote object metadata and key conventions.
//!
//! Remote keys always use `/`. Local paths use the platform separator.
//! Conversion between the two happens here and nowhere else.

use crate::error::{BackendError, BackendResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

/// One object in a remote listing.
///
/// Listings are fetched fresh for every operation and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Forward-slash key relative to the target.
    pub key: String,
    /// Lowercase hex MD5 of the content, when the store reports one.
    pub checksum: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when reported.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Whether an upload created a new object or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    /// No object existed under the key.
    Created,
    /// An existing object was overwritten.
    Updated,
}

/// Display metadata for a folder, bucket or container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    /// Target identifier (folder id, bucket or container name).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Browser link, when available.
    pub url: Option<String>,
}

/// Converts a local path under `root` to a remote key.
///
/// # Errors
///
/// Returns a validation error if the path is outside `root` or not a
/// plain relative path.
pub fn local_to_key(root: &Path, path: &Path) -> BackendResult<String> {
    let relative = if path.is_absolute() {
        path.strip_prefix(root).map_err(|_| {
            BackendError::Validation(format!("{} is outside {}", path.display(), root.display()))
        })?
    } else {
        path
    };
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(BackendError::Validation(format!(
                    "path {} cannot be used as a remote key",
                    path.display()
                )))
            }
        }
    }
    let key = parts.join("/");
    validate_key(&key)?;
    Ok(key)
}

/// Converts a remote key to a local path under `root`.
///
/// # Errors
///
/// Returns a validation error for keys that would escape `root`.
pub fn key_to_local(root: &Path, key: &str) -> BackendResult<PathBuf> {
    validate_key(key)?;
    Ok(key.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part)))
}

/// Rejects keys that are empty, absolute, contain `.`/`..` segments or
/// backslashes.
///
/// # Errors
///
/// Returns a validation error describing the problem.
pub fn validate_key(key: &str) -> BackendResult<()> {
    if key.is_empty() {
        return Err(BackendError::Validation("empty object key".into()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(BackendError::Validation(format!("invalid object key `{key}`")));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(BackendError::Validation(format!("invalid object key `{key}`")));
    }
    Ok(())
}

/// Converts a base64 MD5 (as reported by GCS and Azure) to lowercase hex.
#[must_use]
pub fn checksum_from_base64(encoded: &str) -> Option<String> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return None;
    }
    STANDARD.decode(encoded).ok().map(hex::encode)
}

/// Normalizes an S3 ETag to a bare lowercase checksum.
#[must_use]
pub fn checksum_from_etag(etag: &str) -> Option<String> {
    let trimmed = etag.trim().trim_matches('"');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_local_paths() {
        let root = Path::new("/work/proj");
        let local = key_to_local(root, "docs/a.txt").unwrap();
        assert_eq!(local, root.join("docs").join("a.txt"));
        assert_eq!(local_to_key(root, &local).unwrap(), "docs/a.txt");
        assert_eq!(local_to_key(root, Path::new("./b.txt")).unwrap(), "b.txt");
    }

    #[test]
    fn escaping_keys_are_rejected() {
        let root = Path::new("/work/proj");
        for key in ["", "/etc/passwd", "../up", "a/../../b", "a//b", "a\\b", "./a"] {
            assert!(key_to_local(root, key).is_err(), "{key} accepted");
        }
        assert!(local_to_key(root, Path::new("/other/a.txt")).is_err());
        assert!(local_to_key(root, Path::new("../a.txt")).is_err());
    }

    #[test]
    fn checksum_normalization() {
        // md5("hello") in base64
        assert_eq!(
            checksum_from_base64("XUFAKrxLKna5cZ2REBfFkg==").as_deref(),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
        assert_eq!(checksum_from_base64(""), None);
        assert_eq!(checksum_from_base64("!!"), None);
        assert_eq!(
            checksum_from_etag("\"5D41402ABC4B2A76B9719D911017C592\"").as_deref(),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
        assert_eq!(checksum_from_etag("\"\""), None);
    }
}
