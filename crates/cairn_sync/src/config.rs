//! Configuration for the sync engine.

use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Downloads run in parallel windows of this many files by default.
pub const DEFAULT_CONCURRENCY_WINDOW: usize = 5;

/// Configuration for sync operations.
#[derive(Clone)]
pub struct SyncConfig {
    /// Maximum number of downloads in flight at once.
    pub concurrency_window: usize,
    /// Where encryption artifacts are staged. Defaults to `<home>/.cairn/tmp`.
    pub temp_dir: Option<PathBuf>,
    passphrase: Option<Zeroizing<String>>,
}

impl SyncConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            concurrency_window: DEFAULT_CONCURRENCY_WINDOW,
            temp_dir: None,
            passphrase: None,
        }
    }

    /// Sets the download window. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency_window(mut self, window: usize) -> Self {
        self.concurrency_window = window.max(1);
        self
    }

    /// Sets the temporary directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Supplies the encryption passphrase up front instead of prompting.
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.into()));
        self
    }

    /// The configured passphrase, if any.
    #[must_use]
    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref().map(String::as_str)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("concurrency_window", &self.concurrency_window)
            .field("temp_dir", &self.temp_dir)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
