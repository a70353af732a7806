//! Ignore rules for working-tree enumeration.

use crate::error::{CoreError, CoreResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Patterns every repository ignores.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] =
    &[".cairn", ".git", "node_modules", ".DS_Store", "Thumbs.db", "*.log"];

/// Per-repository ignore file, one pattern per line.
pub const IGNORE_FILE: &str = ".cairnignore";

/// Compiled ignore patterns.
///
/// A pattern containing glob metacharacters is matched against both the
/// full root-relative path and the file name. Any other pattern matches a
/// path equal to it, or any path with a component of that name.
/// Components starting with `.` are always ignored.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    names: Vec<String>,
    globs: GlobSet,
}

impl IgnoreRules {
    /// Compiles the given patterns.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid glob.
    pub fn new<I, S>(patterns: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Vec::new();
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().trim_end_matches('/');
            if pattern.is_empty() {
                continue;
            }
            if pattern.contains(['*', '?', '[', '{']) {
                let glob = Glob::new(pattern).map_err(|e| {
                    CoreError::validation(format!("invalid ignore pattern `{pattern}`: {e}"))
                })?;
                builder.add(glob);
            } else {
                names.push(pattern.to_string());
            }
        }
        let globs = builder
            .build()
            .map_err(|e| CoreError::validation(format!("invalid ignore patterns: {e}")))?;
        Ok(Self { names, globs })
    }

    /// The built-in patterns only.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the built-in globs are valid.
    pub fn defaults() -> CoreResult<Self> {
        Self::new(DEFAULT_IGNORE_PATTERNS)
    }

    /// The built-in patterns plus those in `<root>/.cairnignore`.
    ///
    /// Blank lines and lines starting with `#` are skipped. A missing file
    /// contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or holds an
    /// invalid glob.
    pub fn load(root: &Path) -> CoreResult<Self> {
        let mut patterns: Vec<String> =
            DEFAULT_IGNORE_PATTERNS.iter().map(|p| (*p).to_string()).collect();
        match std::fs::read_to_string(root.join(IGNORE_FILE)) {
            Ok(content) => patterns.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(String::from),
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Self::new(patterns)
    }

    /// Returns `true` if a root-relative forward-slash path is ignored.
    #[must_use]
    pub fn is_ignored(&self, relative: &str) -> bool {
        let relative = relative.trim_start_matches("./");
        if relative.is_empty() {
            return false;
        }

        let mut components = relative.split('/').filter(|c| !c.is_empty());
        if components.any(|c| c.starts_with('.') && c != "." && c != "..") {
            return true;
        }

        if self
            .names
            .iter()
            .any(|name| Self::matches_name(relative, name))
        {
            return true;
        }

        let file_name = relative.rsplit('/').next().unwrap_or(relative);
        self.globs.is_match(relative) || self.globs.is_match(file_name)
    }

    fn matches_name(relative: &str, name: &str) -> bool {
        relative == name
            || relative
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('/'))
            || relative.split('/').any(|component| component == name)
    }
}
