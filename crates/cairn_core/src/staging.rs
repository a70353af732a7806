//! Stage and commit log lifecycle.

use crate::error::{CoreError, CoreResult};
use crate::fingerprint::fingerprint_file;
use crate::model::{Commit, FileSnapshot, RemoteInfo};
use crate::repository::Repository;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Argument meaning "everything".
pub const ALL_PATHS: &str = ".";

const COMMIT_ID_BYTES: usize = 8;
const RECENT_COMMITS: usize = 3;

/// Ordered set of root-relative paths pending commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StageSet(Vec<String>);

impl StageSet {
    /// Adds a path. Returns `false` if it was already staged.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.0.push(path);
        true
    }

    /// Removes a path. Returns `true` if it was staged.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|p| p != path);
        self.0.len() != before
    }

    /// Returns `true` if the path is staged.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }

    /// Empties the set, returning how many paths were removed.
    pub fn clear(&mut self) -> usize {
        let n = self.0.len();
        self.0.clear();
        n
    }

    /// Number of staged paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Staged paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Staged paths as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for StageSet {
    fn from(paths: Vec<String>) -> Self {
        let mut set = StageSet::default();
        for path in paths {
            set.insert(path);
        }
        set
    }
}

impl From<StageSet> for Vec<String> {
    fn from(set: StageSet) -> Self {
        set.0
    }
}

/// Result of staging one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Newly added to the stage.
    Staged,
    /// Was already on the stage.
    AlreadyStaged,
    /// No such file in the working tree.
    NotFound,
    /// Excluded by ignore rules.
    Ignored,
}

/// Result of unstaging one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnstageOutcome {
    /// Removed from the stage.
    Unstaged,
    /// Was not on the stage.
    NotStaged,
}

/// A staged path as seen by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    /// Root-relative path.
    pub path: String,
    /// Current size, `None` if the file has since been deleted.
    pub size: Option<u64>,
}

/// Summary of the working state.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Branch label from settings.
    pub branch: String,
    /// Recorded remote, if any.
    pub remote: Option<RemoteInfo>,
    /// Staged files with current sizes.
    pub staged: Vec<StagedEntry>,
    /// Commits not yet pushed.
    pub unpushed: usize,
    /// All commits.
    pub total_commits: usize,
    /// Up to three most recent commits, newest first.
    pub recent: Vec<Commit>,
}

fn new_commit_id() -> String {
    let mut bytes = [0u8; COMMIT_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Repository {
    /// Stages paths.
    ///
    /// A lone `.` stages every non-ignored file in the tree; a directory
    /// stages the non-ignored files below it. Paths are interpreted relative
    /// to the repository root. The stage is written once at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if enumeration or the stage write fails.
    pub fn add<S: AsRef<str>>(&self, paths: &[S]) -> CoreResult<Vec<(String, StageOutcome)>> {
        let ctx = self.context();
        let mut stage = self.stage();
        let mut outcomes = Vec::new();
        let mut candidates = Vec::new();

        for arg in paths {
            let arg = arg.as_ref();
            if arg == ALL_PATHS {
                candidates.extend(self.enumerator().files(ctx.root(), "")?);
                continue;
            }
            let Some(key) = ctx.relative_key(Path::new(arg)).filter(|k| !k.is_empty()) else {
                outcomes.push((arg.to_string(), StageOutcome::NotFound));
                continue;
            };
            if self.enumerator().is_ignored(&key) {
                outcomes.push((key, StageOutcome::Ignored));
                continue;
            }
            let local = ctx.local_path(&key);
            if local.is_dir() {
                candidates.extend(self.enumerator().files(ctx.root(), &key)?);
            } else if local.is_file() {
                candidates.push(key);
            } else {
                outcomes.push((key, StageOutcome::NotFound));
            }
        }

        let mut changed = false;
        for path in candidates {
            if stage.insert(path.clone()) {
                changed = true;
                outcomes.push((path, StageOutcome::Staged));
            } else {
                outcomes.push((path, StageOutcome::AlreadyStaged));
            }
        }

        if changed {
            self.save_stage(&stage)?;
        }
        tracing::debug!(staged = stage.len(), "stage updated");
        Ok(outcomes)
    }

    /// Unstages paths. A lone `.` clears the stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage write fails.
    pub fn remove<S: AsRef<str>>(&self, paths: &[S]) -> CoreResult<Vec<(String, UnstageOutcome)>> {
        let mut stage = self.stage();

        if paths.len() == 1 && paths[0].as_ref() == ALL_PATHS {
            let outcomes = stage
                .iter()
                .map(|p| (p.to_string(), UnstageOutcome::Unstaged))
                .collect();
            if stage.clear() > 0 {
                self.save_stage(&stage)?;
            }
            return Ok(outcomes);
        }

        let mut outcomes = Vec::with_capacity(paths.len());
        let mut changed = false;
        for arg in paths {
            let arg = arg.as_ref();
            let key = self
                .context()
                .relative_key(Path::new(arg))
                .unwrap_or_else(|| arg.to_string());
            if stage.remove(&key) {
                changed = true;
                outcomes.push((key, UnstageOutcome::Unstaged));
            } else {
                outcomes.push((key, UnstageOutcome::NotStaged));
            }
        }

        if changed {
            self.save_stage(&stage)?;
        }
        Ok(outcomes)
    }

    /// Clears the stage. Returns how many paths were unstaged.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage write fails.
    pub fn reset(&self) -> CoreResult<usize> {
        let mut stage = self.stage();
        let n = stage.clear();
        self.save_stage(&stage)?;
        Ok(n)
    }

    /// Snapshots every staged file into a new commit and clears the stage.
    ///
    /// Files that cannot be read are recorded with a `None` hash and a
    /// warning; they do not fail the commit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToCommit`] for an empty stage,
    /// [`CoreError::Validation`] for an empty message, or a write error.
    pub async fn commit(&self, message: &str) -> CoreResult<Commit> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::validation("commit message must not be empty"));
        }
        let stage = self.stage();
        if stage.is_empty() {
            return Err(CoreError::NothingToCommit);
        }

        let mut files = Vec::with_capacity(stage.len());
        for path in stage.iter() {
            let local = self.context().local_path(path);
            let snapshot = match snapshot_file(&local).await {
                Ok((hash, size)) => FileSnapshot {
                    path: path.to_string(),
                    hash: Some(hash),
                    size,
                },
                Err(e) => {
                    tracing::warn!(path, error = %e, "could not hash staged file");
                    FileSnapshot {
                        path: path.to_string(),
                        hash: None,
                        size: 0,
                    }
                }
            };
            files.push(snapshot);
        }

        let commit = Commit {
            id: new_commit_id(),
            message: message.to_string(),
            file_count: files.len(),
            files,
            timestamp: Utc::now(),
            pushed: false,
            pushed_at: None,
            amended_at: None,
        };

        let mut commits = self.commits();
        commits.push(commit.clone());
        // Two atomic replaces, log first: a crash in between keeps the
        // commit and leaves the stage populated; `reset` clears it.
        self.save_commits(&commits)?;
        self.save_stage(&StageSet::default())?;

        tracing::info!(id = %commit.id, files = commit.file_count, "commit created");
        Ok(commit)
    }

    /// Rewrites the message of the most recent commit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoCommits`] if the log is empty and
    /// [`CoreError::AmendRejected`] if the last commit is already pushed.
    pub fn amend(&self, message: &str) -> CoreResult<Commit> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::validation("commit message must not be empty"));
        }
        let mut commits = self.commits();
        let last = commits.last_mut().ok_or(CoreError::NoCommits)?;
        if last.pushed {
            return Err(CoreError::AmendRejected {
                id: last.id.clone(),
            });
        }
        last.message = message.to_string();
        last.amended_at = Some(Utc::now());
        let amended = last.clone();
        self.save_commits(&commits)?;
        Ok(amended)
    }

    /// Commits newest first, at most `limit` of them.
    #[must_use]
    pub fn log(&self, limit: Option<usize>) -> Vec<Commit> {
        let commits = self.commits();
        let limit = limit.unwrap_or(commits.len());
        commits.into_iter().rev().take(limit).collect()
    }

    /// Commits with `pushed == false`, oldest first.
    #[must_use]
    pub fn unpushed_commits(&self) -> Vec<Commit> {
        self.commits().into_iter().filter(|c| !c.pushed).collect()
    }

    /// Marks the given commits pushed in a single write.
    ///
    /// Returns how many commits changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn mark_pushed(&self, ids: &[String], at: DateTime<Utc>) -> CoreResult<usize> {
        let mut commits = self.commits();
        let mut changed = 0;
        for commit in commits.iter_mut().filter(|c| !c.pushed && ids.contains(&c.id)) {
            commit.pushed = true;
            commit.pushed_at = Some(at);
            changed += 1;
        }
        if changed > 0 {
            self.save_commits(&commits)?;
        }
        Ok(changed)
    }

    /// Marks every commit unpushed so the next push replays them.
    ///
    /// Returns how many commits were reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn reset_pushed(&self) -> CoreResult<usize> {
        let mut commits = self.commits();
        let mut changed = 0;
        for commit in commits.iter_mut().filter(|c| c.pushed) {
            commit.pushed = false;
            commit.pushed_at = None;
            changed += 1;
        }
        self.save_commits(&commits)?;
        Ok(changed)
    }

    /// Every path on the stage or in any commit.
    #[must_use]
    pub fn tracked_paths(&self) -> BTreeSet<String> {
        let mut paths: BTreeSet<String> = self.stage().iter().map(String::from).collect();
        for commit in self.commits() {
            paths.extend(commit.files.into_iter().map(|f| f.path));
        }
        paths
    }

    /// Stage, commit and remote summary.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        let commits = self.commits();
        let staged = self
            .stage()
            .iter()
            .map(|path| StagedEntry {
                path: path.to_string(),
                size: std::fs::metadata(self.context().local_path(path))
                    .ok()
                    .filter(|m| m.is_file())
                    .map(|m| m.len()),
            })
            .collect();

        StatusReport {
            branch: self.settings().default_branch,
            remote: self.remote(),
            staged,
            unpushed: commits.iter().filter(|c| !c.pushed).count(),
            total_commits: commits.len(),
            recent: commits.iter().rev().take(RECENT_COMMITS).cloned().collect(),
        }
    }
}

async fn snapshot_file(path: &Path) -> std::io::Result<(String, u64)> {
    let hash = fingerprint_file(path).await?;
    let size = tokio::fs::metadata(path).await?.len();
    Ok((hash, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RepoContext;
    use crate::fingerprint::fingerprint;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn repo() -> (TempDir, Repository) {
        let dir = tempdir().unwrap();
        let ctx = RepoContext::new(dir.path().join("proj"), dir.path().join("home"));
        let repo = Repository::init(ctx).unwrap();
        (dir, repo)
    }

    fn write(repo: &Repository, rel: &str, data: &[u8]) {
        let path = repo.context().local_path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn stage_set_deduplicates_on_load() {
        let set: StageSet = serde_json::from_str(r#"["a","b","a"]"#).unwrap();
        assert_eq!(set.as_slice(), ["a", "b"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn add_reports_each_outcome() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", b"a");
        write(&repo, "app.log", b"log");

        let outcomes = repo.add(&["a.txt", "missing.txt", "app.log", "a.txt"]).unwrap();
        assert_eq!(
            outcomes,
            vec![
                ("missing.txt".to_string(), StageOutcome::NotFound),
                ("app.log".to_string(), StageOutcome::Ignored),
                ("a.txt".to_string(), StageOutcome::Staged),
                ("a.txt".to_string(), StageOutcome::AlreadyStaged),
            ]
        );
        assert_eq!(repo.stage().as_slice(), ["a.txt"]);
    }

    #[test]
    fn add_all_and_directories() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", b"a");
        write(&repo, "docs/b.md", b"b");
        write(&repo, "docs/c.md", b"c");

        let outcomes = repo.add(&["docs"]).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, o)| *o == StageOutcome::Staged));

        let outcomes = repo.add(&["."]).unwrap();
        let staged: Vec<_> = outcomes
            .iter()
            .filter(|(_, o)| *o == StageOutcome::Staged)
            .map(|(p, _)| p.as_str())
            .collect();
        assert_eq!(staged, vec!["a.txt"]);
        assert_eq!(repo.stage().len(), 3);
    }

    #[test]
    fn remove_and_reset() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", b"a");
        write(&repo, "b.txt", b"b");
        repo.add(&["."]).unwrap();

        let outcomes = repo.remove(&["a.txt", "zzz"]).unwrap();
        assert_eq!(outcomes[0], ("a.txt".to_string(), UnstageOutcome::Unstaged));
        assert_eq!(outcomes[1], ("zzz".to_string(), UnstageOutcome::NotStaged));
        assert_eq!(repo.stage().as_slice(), ["b.txt"]);

        repo.add(&["a.txt"]).unwrap();
        assert_eq!(repo.remove(&["."]).unwrap().len(), 2);
        assert!(repo.stage().is_empty());

        repo.add(&["."]).unwrap();
        assert_eq!(repo.reset().unwrap(), 2);
        assert!(repo.stage().is_empty());
    }

    #[tokio::test]
    async fn commit_snapshots_and_clears_stage() {
        let (_dir, repo) = repo();
        write(&repo, "A.txt", b"hello");
        write(&repo, "B.txt", b"world");
        repo.add(&["A.txt", "B.txt"]).unwrap();

        let commit = repo.commit("init").await.unwrap();
        assert_eq!(commit.file_count, 2);
        assert!(!commit.pushed);
        assert_eq!(commit.id.len(), COMMIT_ID_BYTES * 2);
        assert_eq!(commit.files[0].hash.as_deref(), Some(fingerprint(b"hello").as_str()));
        assert_eq!(commit.files[1].hash.as_deref(), Some(fingerprint(b"world").as_str()));
        assert_eq!(commit.files[0].size, 5);
        assert!(repo.stage().is_empty());
        assert_eq!(repo.commits(), vec![commit]);
    }

    #[tokio::test]
    async fn commit_snapshot_is_frozen() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", b"v1");
        repo.add(&["a.txt"]).unwrap();
        repo.commit("first").await.unwrap();

        write(&repo, "a.txt", b"v2 changed");
        let stored = &repo.commits()[0];
        assert_eq!(stored.files[0].hash.as_deref(), Some(fingerprint(b"v1").as_str()));
    }

    #[tokio::test]
    async fn unreadable_file_records_null_hash() {
        let (_dir, repo) = repo();
        write(&repo, "gone.txt", b"x");
        repo.add(&["gone.txt"]).unwrap();
        fs::remove_file(repo.context().local_path("gone.txt")).unwrap();

        let commit = repo.commit("with missing").await.unwrap();
        assert_eq!(commit.files[0].hash, None);
        assert_eq!(commit.file_count, 1);
    }

    #[tokio::test]
    async fn empty_stage_cannot_commit() {
        let (_dir, repo) = repo();
        assert!(matches!(repo.commit("x").await, Err(CoreError::NothingToCommit)));
    }

    #[tokio::test]
    async fn amend_rules() {
        let (_dir, repo) = repo();
        assert!(matches!(repo.amend("x"), Err(CoreError::NoCommits)));

        write(&repo, "a.txt", b"a");
        repo.add(&["a.txt"]).unwrap();
        let commit = repo.commit("typo").await.unwrap();

        let amended = repo.amend("fixed").unwrap();
        assert_eq!(amended.message, "fixed");
        assert!(amended.amended_at.is_some());
        assert_eq!(amended.files, commit.files);

        repo.mark_pushed(&[commit.id.clone()], Utc::now()).unwrap();
        assert!(matches!(
            repo.amend("again"),
            Err(CoreError::AmendRejected { id }) if id == commit.id
        ));
    }

    #[tokio::test]
    async fn push_flags() {
        let (_dir, repo) = repo();
        for (i, name) in ["a", "b"].iter().enumerate() {
            write(&repo, name, name.as_bytes());
            repo.add(&[*name]).unwrap();
            repo.commit(&format!("c{i}")).await.unwrap();
        }
        let ids: Vec<String> = repo.unpushed_commits().into_iter().map(|c| c.id).collect();
        assert_eq!(repo.mark_pushed(&ids, Utc::now()).unwrap(), 2);
        assert!(repo.unpushed_commits().is_empty());
        assert!(repo.commits().iter().all(|c| c.pushed_at.is_some()));

        assert_eq!(repo.reset_pushed().unwrap(), 2);
        assert_eq!(repo.unpushed_commits().len(), 2);
    }

    #[tokio::test]
    async fn log_and_status() {
        let (_dir, repo) = repo();
        for i in 0..4 {
            let name = format!("f{i}.txt");
            write(&repo, &name, b"x");
            repo.add(&[name.as_str()]).unwrap();
            repo.commit(&format!("commit {i}")).await.unwrap();
        }
        write(&repo, "pending.txt", b"12345");
        repo.add(&["pending.txt", "f0.txt"]).unwrap();
        fs::remove_file(repo.context().local_path("f0.txt")).unwrap();

        let log = repo.log(Some(2));
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "commit 3");

        let status = repo.status();
        assert_eq!(status.branch, "main");
        assert_eq!(status.total_commits, 4);
        assert_eq!(status.unpushed, 4);
        assert_eq!(status.recent.len(), 3);
        assert_eq!(status.staged[0].size, Some(5));
        assert_eq!(status.staged[1].size, None);
        assert_eq!(repo.tracked_paths().len(), 5);
    }
}
