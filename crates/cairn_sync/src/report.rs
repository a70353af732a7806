//! Per-file outcomes and batch summaries.

use cairn_backend::{RemoteObject, UploadAction};

/// Why a file was not transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The local file no longer exists.
    LocalMissing,
    /// Local and remote fingerprints match.
    UpToDate,
    /// A conflict was resolved in favour of the local bytes.
    KeptLocal,
    /// The key maps to an ignored path, such as repository state.
    Ignored,
}

impl SkipReason {
    /// Short description for summaries.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            SkipReason::LocalMissing => "file deleted",
            SkipReason::UpToDate => "up to date",
            SkipReason::KeptLocal => "kept local",
            SkipReason::Ignored => "ignored",
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Uploaded to a new key.
    Created,
    /// Uploaded over an existing key.
    Updated,
    /// Downloaded into the working tree.
    Downloaded,
    /// Removed from the remote.
    Deleted,
    /// Not transferred.
    Skipped(SkipReason),
    /// The transfer failed; the message says why.
    Failed(String),
}

impl From<UploadAction> for FileOutcome {
    fn from(action: UploadAction) -> Self {
        match action {
            UploadAction::Created => FileOutcome::Created,
            UploadAction::Updated => FileOutcome::Updated,
        }
    }
}

/// Outcome for one path or key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Root-relative path or remote key.
    pub path: String,
    /// What happened.
    pub outcome: FileOutcome,
    /// Bytes moved over the wire.
    pub bytes: u64,
}

impl FileReport {
    pub(crate) fn new(path: impl Into<String>, outcome: FileOutcome) -> Self {
        Self {
            path: path.into(),
            outcome,
            bytes: 0,
        }
    }

    pub(crate) fn skipped(path: impl Into<String>, reason: SkipReason) -> Self {
        Self::new(path, FileOutcome::Skipped(reason))
    }

    pub(crate) fn failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, FileOutcome::Failed(message.into()))
    }

    pub(crate) fn with_bytes(mut self, bytes: u64) -> Self {
        self.bytes = bytes;
        self
    }

    /// Returns `true` if the transfer failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed(_))
    }
}

/// Result of a push or an upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// New remote objects.
    pub created: usize,
    /// Overwritten remote objects.
    pub updated: usize,
    /// Files not transferred.
    pub skipped: usize,
    /// Files that failed.
    pub failed: usize,
    /// Bytes uploaded.
    pub bytes: u64,
    /// Commits marked pushed by this pass.
    pub commits: usize,
    /// Per-file detail, in processing order.
    pub files: Vec<FileReport>,
}

impl PushSummary {
    pub(crate) fn record(&mut self, report: FileReport) {
        match &report.outcome {
            FileOutcome::Created => self.created += 1,
            FileOutcome::Updated => self.updated += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Failed(_) => self.failed += 1,
            FileOutcome::Downloaded | FileOutcome::Deleted => {}
        }
        self.bytes += report.bytes;
        self.files.push(report);
    }

    /// Files uploaded, new or overwritten.
    #[must_use]
    pub fn uploaded(&self) -> usize {
        self.created + self.updated
    }
}

/// Result of a pull or a download batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullSummary {
    /// Files written locally.
    pub downloaded: usize,
    /// Files left alone.
    pub skipped: usize,
    /// Files that failed.
    pub failed: usize,
    /// Bytes downloaded.
    pub bytes: u64,
    /// Per-file detail, sorted by key.
    pub files: Vec<FileReport>,
    /// Objects a dry run would consider. Empty unless dry-run.
    pub planned: Vec<RemoteObject>,
}

impl PullSummary {
    pub(crate) fn record(&mut self, report: FileReport) {
        match &report.outcome {
            FileOutcome::Downloaded => self.downloaded += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Failed(_) => self.failed += 1,
            FileOutcome::Created | FileOutcome::Updated | FileOutcome::Deleted => {}
        }
        self.bytes += report.bytes;
        self.files.push(report);
    }
}

/// Result of a delete batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Objects removed.
    pub deleted: usize,
    /// Objects that could not be removed.
    pub failed: usize,
    /// Per-key detail.
    pub files: Vec<FileReport>,
}

impl DeleteSummary {
    pub(crate) fn record(&mut self, report: FileReport) {
        match report.outcome {
            FileOutcome::Deleted => self.deleted += 1,
            _ => self.failed += 1,
        }
        self.files.push(report);
    }
}

/// Result of a whole-tree sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSummary {
    /// Working tree uploaded.
    Push(PushSummary),
    /// Remote downloaded.
    Pull(PullSummary),
}

impl SyncSummary {
    /// Number of failed files.
    #[must_use]
    pub fn failed(&self) -> usize {
        match self {
            SyncSummary::Push(s) => s.failed,
            SyncSummary::Pull(s) => s.failed,
        }
    }
}

/// Tracked files compared against the remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Tracked locally, absent remotely.
    pub added: Vec<String>,
    /// Present on both sides with different fingerprints.
    pub modified: Vec<String>,
    /// Tracked and present remotely, but gone locally.
    pub deleted: Vec<String>,
    /// Remote objects no local path tracks.
    pub remote_only: Vec<String>,
}

impl DiffReport {
    /// Returns `true` if there is nothing to report.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.remote_only.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_summary_counts_by_outcome() {
        let mut summary = PushSummary::default();
        summary.record(FileReport::new("a", FileOutcome::Created).with_bytes(5));
        summary.record(FileReport::new("b", FileOutcome::Updated).with_bytes(7));
        summary.record(FileReport::skipped("c", SkipReason::UpToDate));
        summary.record(FileReport::failed("d", "boom"));
        assert_eq!(
            (summary.created, summary.updated, summary.skipped, summary.failed),
            (1, 1, 1, 1)
        );
        assert_eq!(summary.uploaded(), 2);
        assert_eq!(summary.bytes, 12);
        assert!(summary.files[3].is_failure());
    }

    #[test]
    fn delete_summary_counts_everything_else_as_failure() {
        let mut summary = DeleteSummary::default();
        summary.record(FileReport::new("a", FileOutcome::Deleted));
        summary.record(FileReport::failed("b", "gone"));
        assert_eq!((summary.deleted, summary.failed), (1, 1));
    }

    #[test]
    fn clean_diff() {
        assert!(DiffReport::default().is_clean());
        let diff = DiffReport {
            remote_only: vec!["x".into()],
            ..DiffReport::default()
        };
        assert!(!diff.is_clean());
    }
}
