//! A sync engine wired to in-memory collaborators.

use crate::fixtures::TestWorkspace;
use cairn_backend::MemoryBackend;
use cairn_core::{BackendKind, ScriptedPrompter};
use cairn_sync::{SyncConfig, SyncEngine};
use std::sync::Arc;

/// Target used by [`SyncHarness`].
pub const TEST_TARGET: &str = "test-bucket";

/// Passphrase used for encrypted harnesses.
pub const TEST_PASSPHRASE: &str = "correct horse battery staple";

/// A workspace, an in-memory remote with one target, and engine settings.
pub struct SyncHarness {
    /// The local repository.
    pub workspace: TestWorkspace,
    /// The remote store.
    pub backend: Arc<MemoryBackend>,
    /// Settings passed to every engine.
    pub config: SyncConfig,
}

impl SyncHarness {
    /// A plaintext harness over an S3-like store.
    pub fn new() -> Self {
        Self::with_kind(BackendKind::S3)
    }

    /// A plaintext harness reporting `kind`.
    pub fn with_kind(kind: BackendKind) -> Self {
        let workspace = TestWorkspace::new();
        let config = SyncConfig::new().with_temp_dir(workspace.scratch().join("tmp"));
        Self {
            workspace,
            backend: Arc::new(MemoryBackend::with_target(kind, TEST_TARGET)),
            config,
        }
    }

    /// A harness with encryption on and [`TEST_PASSPHRASE`] preset.
    pub fn encrypted() -> Self {
        let mut harness = Self::new();
        harness.workspace.enable_encryption();
        harness.config = harness.config.clone().with_passphrase(TEST_PASSPHRASE);
        harness
    }

    /// An engine whose prompts all fail; fine for non-interactive paths.
    pub fn engine(&self) -> SyncEngine {
        self.engine_with(ScriptedPrompter::new())
    }

    /// An engine answering every confirmation with yes.
    pub fn confirming_engine(&self) -> SyncEngine {
        self.engine_with(ScriptedPrompter::always(true))
    }

    /// An engine driven by `prompter`.
    pub fn engine_with(&self, prompter: ScriptedPrompter) -> SyncEngine {
        self.engine_sharing(Arc::new(prompter))
    }

    /// An engine driven by a prompter the test keeps a handle to.
    pub fn engine_sharing(&self, prompter: Arc<ScriptedPrompter>) -> SyncEngine {
        SyncEngine::new(
            self.workspace.repo.clone(),
            self.backend.clone(),
            TEST_TARGET,
            prompter,
            self.config.clone(),
        )
    }

    /// Stores an object directly in the remote.
    pub fn put_remote(&self, key: &str, contents: &[u8]) {
        self.backend.insert(TEST_TARGET, key, contents.to_vec());
    }

    /// Reads an object directly from the remote.
    pub fn remote_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.backend.get(TEST_TARGET, key).map(|b| b.to_vec())
    }

    /// Keys currently in the remote.
    pub fn remote_keys(&self) -> Vec<String> {
        self.backend.keys(TEST_TARGET)
    }
}

impl Default for SyncHarness {
    fn default() -> Self {
        Self::new()
    }
}
