//! Working-tree enumeration.

use crate::error::CoreResult;
use crate::ignore::IgnoreRules;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Lists the files of a working tree.
///
/// Paths are root-relative with forward slashes, sorted, and exclude
/// everything the enumerator's ignore rules reject.
pub trait PathEnumerator: Send + Sync {
    /// Lists files below `under` (a root-relative path, `""` for the whole tree).
    ///
    /// # Errors
    ///
    /// Returns an error if the starting directory cannot be read.
    fn files(&self, root: &Path, under: &str) -> CoreResult<Vec<String>>;

    /// Returns `true` if a root-relative path is excluded.
    fn is_ignored(&self, relative: &str) -> bool;
}

/// [`PathEnumerator`] backed by `walkdir`.
///
/// Ignored directories are pruned rather than descended into. Symbolic
/// links are not followed.
#[derive(Debug, Clone)]
pub struct WalkdirEnumerator {
    rules: IgnoreRules,
}

impl WalkdirEnumerator {
    /// Creates an enumerator with explicit rules.
    #[must_use]
    pub fn new(rules: IgnoreRules) -> Self {
        Self { rules }
    }

    /// Creates an enumerator with the default rules plus `<root>/.cairnignore`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ignore file cannot be read or parsed.
    pub fn load(root: &Path) -> CoreResult<Self> {
        Ok(Self::new(IgnoreRules::load(root)?))
    }
}

/// Root-relative forward-slash form of `path`, or `None` if it is outside `root`.
pub(crate) fn slash_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

impl PathEnumerator for WalkdirEnumerator {
    fn files(&self, root: &Path, under: &str) -> CoreResult<Vec<String>> {
        let start = under
            .split('/')
            .filter(|p| !p.is_empty() && *p != ".")
            .fold(root.to_path_buf(), |acc, p| acc.join(p));
        std::fs::metadata(&start)?;

        let walker = WalkDir::new(&start)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match slash_relative(root, entry.path()) {
                Some(rel) => rel.is_empty() || !self.rules.is_ignored(&rel),
                None => false,
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() {
                if let Some(rel) = slash_relative(root, entry.path()) {
                    files.push(rel);
                }
            }
        }
        files.sort();
        Ok(files)
    }

    fn is_ignored(&self, relative: &str) -> bool {
        self.rules.is_ignored(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs/deep")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cairn")).unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("docs/b.md"), b"b").unwrap();
        fs::write(root.join("docs/deep/c.bin"), b"c").unwrap();
        fs::write(root.join("docs/run.log"), b"log").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), b"js").unwrap();
        fs::write(root.join(".cairn/stage.json"), b"[]").unwrap();
        fs::write(root.join(".hidden"), b"h").unwrap();
        dir
    }

    #[test]
    fn whole_tree_honors_ignores() {
        let dir = tree();
        let enumerator = WalkdirEnumerator::load(dir.path()).unwrap();
        let files = enumerator.files(dir.path(), "").unwrap();
        assert_eq!(files, vec!["a.txt", "docs/b.md", "docs/deep/c.bin"]);
    }

    #[test]
    fn subdirectory_listing() {
        let dir = tree();
        let enumerator = WalkdirEnumerator::load(dir.path()).unwrap();
        let files = enumerator.files(dir.path(), "docs/deep").unwrap();
        assert_eq!(files, vec!["docs/deep/c.bin"]);
    }

    #[test]
    fn missing_start_is_an_error() {
        let dir = tree();
        let enumerator = WalkdirEnumerator::load(dir.path()).unwrap();
        assert!(enumerator.files(dir.path(), "nope").is_err());
    }
}
