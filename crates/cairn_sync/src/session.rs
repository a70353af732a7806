//! Encryption session setup and temporary transfer artifacts.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use cairn_core::{CoreError, Prompter, Repository};
use cairn_crypto::{derive_key, Codec, CryptoError, Vault};
use cairn_storage::{Document, StateStore, StateStoreExt};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Reads the vault, creating and storing one on first use.
///
/// A corrupted vault is an error rather than a silent reset; replacing
/// the salt would make every previously encrypted object unreadable.
///
/// # Errors
///
/// Returns an error if the vault cannot be read, parsed or written.
pub fn load_or_create_vault(store: &dyn StateStore) -> SyncResult<Vault> {
    if let Some(vault) = store
        .read::<Vault>(Document::Vault)
        .map_err(CoreError::from)?
    {
        return Ok(vault);
    }
    let vault = Vault::generate();
    store
        .write(Document::Vault, &vault)
        .map_err(CoreError::from)?;
    tracing::info!("created encryption vault");
    Ok(vault)
}

/// Derives the session codec if the repository has encryption enabled.
///
/// The passphrase comes from `config` or, failing that, the prompter.
/// Derivation runs once per operation on the blocking pool.
pub(crate) async fn open_codec(
    repo: &Repository,
    prompter: &dyn Prompter,
    config: &SyncConfig,
) -> SyncResult<Option<Codec>> {
    if !repo.config().encryption {
        return Ok(None);
    }

    let passphrase = match config.passphrase() {
        Some(p) => Zeroizing::new(p.to_string()),
        None => Zeroizing::new(prompter.password("Encryption passphrase")?),
    };
    if passphrase.is_empty() {
        return Err(SyncError::validation(
            "a passphrase is required for encrypted repositories",
        ));
    }

    let vault = load_or_create_vault(repo.store().as_ref())?;
    let key = tokio::task::spawn_blocking(move || derive_key(&passphrase, &vault))
        .await
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))??;
    tracing::debug!("encryption session opened");
    Ok(Some(Codec::new(key)))
}

/// A scratch file removed when dropped, whatever happened to the transfer.
#[derive(Debug)]
pub(crate) struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub(crate) async fn new(dir: &Path, purpose: &str) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            path: dir.join(format!("{purpose}-{}", Uuid::new_v4().simple())),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to remove temporary file");
            }
        }
    }
}
