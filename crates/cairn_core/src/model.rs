//! Repository state documents.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of remote a repository synchronizes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hierarchical folder store, addressed by folder id.
    #[default]
    Drive,
    /// Amazon S3 (or compatible), addressed by bucket.
    S3,
    /// Google Cloud Storage, addressed by bucket.
    Gcs,
    /// Azure Blob Storage, addressed by container.
    Azure,
}

impl BackendKind {
    /// All supported kinds.
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Drive,
        BackendKind::S3,
        BackendKind::Gcs,
        BackendKind::Azure,
    ];

    /// Identifier used on the command line and in documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Drive => "drive",
            BackendKind::S3 => "s3",
            BackendKind::Gcs => "gcs",
            BackendKind::Azure => "azure",
        }
    }

    /// Human-readable service name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Drive => "Google Drive",
            BackendKind::S3 => "Amazon S3",
            BackendKind::Gcs => "Google Cloud Storage",
            BackendKind::Azure => "Azure Blob Storage",
        }
    }

    /// What a target of this kind is called.
    #[must_use]
    pub fn target_noun(self) -> &'static str {
        match self {
            BackendKind::Drive => "folder id",
            BackendKind::S3 | BackendKind::Gcs => "bucket",
            BackendKind::Azure => "container",
        }
    }

    /// `true` for the folder-based store.
    #[must_use]
    pub fn is_hierarchical(self) -> bool {
        matches!(self, BackendKind::Drive)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drive" | "gdrive" => Ok(BackendKind::Drive),
            "s3" | "aws" => Ok(BackendKind::S3),
            "gcs" | "gcp" => Ok(BackendKind::Gcs),
            "azure" => Ok(BackendKind::Azure),
            other => Err(CoreError::validation(format!("unknown remote kind `{other}`"))),
        }
    }
}

/// Per-repository configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoConfig {
    /// Display name of the repository.
    #[serde(default)]
    pub name: String,
    /// Folder id in the hierarchical store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// S3 bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<String>,
    /// Google Cloud Storage bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_bucket: Option<String>,
    /// Azure container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_container: Option<String>,
    /// Whether transfers are encrypted.
    #[serde(default)]
    pub encryption: bool,
    /// When the repository was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RepoConfig {
    /// The cached target for a remote kind, if any.
    #[must_use]
    pub fn target(&self, kind: BackendKind) -> Option<&str> {
        let slot = match kind {
            BackendKind::Drive => &self.folder_id,
            BackendKind::S3 => &self.s3_bucket,
            BackendKind::Gcs => &self.gcs_bucket,
            BackendKind::Azure => &self.azure_container,
        };
        slot.as_deref().filter(|t| !t.is_empty())
    }

    /// Caches the target for a remote kind.
    pub fn set_target(&mut self, kind: BackendKind, target: impl Into<String>) {
        let slot = match kind {
            BackendKind::Drive => &mut self.folder_id,
            BackendKind::S3 => &mut self.s3_bucket,
            BackendKind::Gcs => &mut self.gcs_bucket,
            BackendKind::Azure => &mut self.azure_container,
        };
        *slot = Some(target.into());
    }
}

/// Descriptor of the remote a repository was created against or cloned from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInfo {
    /// Remote display name.
    #[serde(default)]
    pub name: String,
    /// Remote kind.
    #[serde(default)]
    pub kind: BackendKind,
    /// Folder id, bucket or container.
    #[serde(default, alias = "folderId")]
    pub target: String,
    /// Browser link, when the store provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When the remote was linked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the repository was cloned from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloned_at: Option<DateTime<Utc>>,
}

/// A staged file frozen at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// Root-relative forward-slash path.
    pub path: String,
    /// Content fingerprint, `None` if the file could not be read.
    pub hash: Option<String>,
    /// Size in bytes at commit time.
    #[serde(default)]
    pub size: u64,
}

/// A recorded snapshot of staged files.
///
/// Only `message` and `amended_at` change after creation, and only while
/// `pushed` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Random hex identifier.
    pub id: String,
    /// Commit message.
    pub message: String,
    /// Snapshots of the staged files.
    pub files: Vec<FileSnapshot>,
    /// Number of staged files at commit time.
    pub file_count: usize,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Whether a push pass has covered this commit.
    #[serde(default)]
    pub pushed: bool,
    /// When the covering push completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_at: Option<DateTime<Utc>>,
    /// When the message was last amended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amended_at: Option<DateTime<Utc>>,
}

/// What to do when a local file differs from its remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Prompt for each conflicting file.
    #[default]
    #[serde(rename = "ask")]
    Ask,
    /// Keep the local bytes.
    #[serde(rename = "local")]
    KeepLocal,
    /// Overwrite with the remote bytes.
    #[serde(rename = "remote")]
    TakeRemote,
}

impl ConflictPolicy {
    /// Returns `true` if the policy needs terminal input.
    #[must_use]
    pub fn is_interactive(self) -> bool {
        matches!(self, ConflictPolicy::Ask)
    }
}

impl FromStr for ConflictPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ask" => Ok(ConflictPolicy::Ask),
            "local" | "keep-local" | "ours" => Ok(ConflictPolicy::KeepLocal),
            "remote" | "take-remote" | "theirs" => Ok(ConflictPolicy::TakeRemote),
            other => Err(CoreError::validation(format!("unknown conflict policy `{other}`"))),
        }
    }
}

/// Per-user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Branch label shown in status output.
    pub default_branch: String,
    /// Whether terminal output is coloured.
    pub color_output: bool,
    /// Whether debug logging is on by default.
    pub verbose_logging: bool,
    /// Default pull conflict policy.
    pub conflict_resolution: ConflictPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_branch: "main".into(),
            color_output: true,
            verbose_logging: false,
            conflict_resolution: ConflictPolicy::Ask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_targets_per_kind() {
        let mut config = RepoConfig::default();
        assert_eq!(config.target(BackendKind::S3), None);

        config.set_target(BackendKind::S3, "bucket-a");
        config.set_target(BackendKind::Drive, "folder-1");
        assert_eq!(config.target(BackendKind::S3), Some("bucket-a"));
        assert_eq!(config.target(BackendKind::Drive), Some("folder-1"));
        assert_eq!(config.target(BackendKind::Azure), None);

        config.set_target(BackendKind::Gcs, "");
        assert_eq!(config.target(BackendKind::Gcs), None);
    }

    #[test]
    fn config_json_field_names() {
        let mut config = RepoConfig {
            name: "proj".into(),
            encryption: true,
            ..RepoConfig::default()
        };
        config.set_target(BackendKind::Azure, "box");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["azureContainer"], "box");
        assert_eq!(json["encryption"], true);
        assert!(json.get("s3Bucket").is_none());
    }

    #[test]
    fn settings_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"conflictResolution":"remote"}"#).unwrap();
        assert_eq!(settings.conflict_resolution, ConflictPolicy::TakeRemote);
        assert_eq!(settings.default_branch, "main");
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("S3".parse::<BackendKind>().unwrap(), BackendKind::S3);
        assert_eq!("gcp".parse::<BackendKind>().unwrap(), BackendKind::Gcs);
        assert!("ftp".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Azure.to_string(), "azure");
    }

    #[test]
    fn commit_serializes_camel_case() {
        let commit = Commit {
            id: "ab12".into(),
            message: "init".into(),
            files: vec![FileSnapshot {
                path: "a.txt".into(),
                hash: None,
                size: 0,
            }],
            file_count: 1,
            timestamp: Utc::now(),
            pushed: false,
            pushed_at: None,
            amended_at: None,
        };
        let json = serde_json::to_value(&commit).unwrap();
        assert_eq!(json["fileCount"], 1);
        assert!(json["files"][0]["hash"].is_null());
        assert!(json.get("pushedAt").is_none());
    }
}
