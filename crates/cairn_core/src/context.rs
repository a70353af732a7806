//! Explicit locations a command operates on.

use std::path::{Path, PathBuf};

/// Name of the state directory, both in the repository and in the home directory.
pub const STATE_DIR: &str = ".cairn";

/// Where the repository and the per-user state live.
///
/// Every component receives this value instead of consulting the process
/// working directory or environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    root: PathBuf,
    home: PathBuf,
}

impl RepoContext {
    /// Creates a context for the working tree at `root` and the user home at `home`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            home: home.into(),
        }
    }

    /// Returns a context for a different working tree with the same home.
    #[must_use]
    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            home: self.home.clone(),
        }
    }

    /// The working tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The user home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `<root>/.cairn`
    #[must_use]
    pub fn repo_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// `<home>/.cairn`
    #[must_use]
    pub fn global_dir(&self) -> PathBuf {
        self.home.join(STATE_DIR)
    }

    /// Scratch space for transfer artifacts.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.global_dir().join("tmp")
    }

    /// Resolves a root-relative forward-slash path to a local path.
    #[must_use]
    pub fn local_path(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Converts a path to the root-relative forward-slash form used in state
    /// documents and remote keys. Relative inputs are taken as relative to the
    /// root. Returns `None` for paths outside the root.
    #[must_use]
    pub fn relative_key(&self, path: &Path) -> Option<String> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root).ok()?
        } else {
            path
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                std::path::Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    parts.pop()?;
                }
                _ => return None,
            }
        }
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_directories() {
        let ctx = RepoContext::new("/work/proj", "/home/me");
        assert_eq!(ctx.repo_dir(), PathBuf::from("/work/proj/.cairn"));
        assert_eq!(ctx.global_dir(), PathBuf::from("/home/me/.cairn"));
        assert_eq!(ctx.temp_dir(), PathBuf::from("/home/me/.cairn/tmp"));
    }

    #[test]
    fn keys_use_forward_slashes() {
        let ctx = RepoContext::new("/work/proj", "/home/me");
        assert_eq!(
            ctx.relative_key(Path::new("/work/proj/docs/a.txt")).as_deref(),
            Some("docs/a.txt")
        );
        assert_eq!(ctx.relative_key(Path::new("./docs/../b.txt")).as_deref(), Some("b.txt"));
        assert_eq!(ctx.relative_key(Path::new("/elsewhere/a.txt")), None);
        assert_eq!(ctx.relative_key(Path::new("../escape.txt")), None);
    }

    #[test]
    fn local_path_round_trip() {
        let ctx = RepoContext::new("/work/proj", "/home/me");
        let local = ctx.local_path("docs/a.txt");
        assert_eq!(local, PathBuf::from("/work/proj").join("docs").join("a.txt"));
        assert_eq!(ctx.relative_key(&local).as_deref(), Some("docs/a.txt"));
    }
}
