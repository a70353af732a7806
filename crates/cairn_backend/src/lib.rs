//! # Cairn Backend
//!
//! One [`RemoteBackend`] trait over four remote stores:
//!
//! - [`DriveBackend`] - Google Drive folders (REST v3)
//! - [`S3Backend`] - Amazon S3 buckets (AWS SDK)
//! - [`GcsBackend`] - Google Cloud Storage buckets (JSON API)
//! - [`AzureBackend`] - Azure Blob containers (REST, SAS)
//!
//! plus [`MemoryBackend`] for tests. Adapters are chosen once per command
//! with [`connect`] and injected into the sync engine.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod azure;
mod backend;
mod credentials;
mod drive;
mod error;
mod gcs;
mod memory;
mod object;
mod resolve;
mod s3;
mod transfer;

pub use azure::AzureBackend;
pub use backend::RemoteBackend;
pub use credentials::{CredentialProvider, Credentials, StaticCredentials};
pub use drive::DriveBackend;
pub use error::{BackendError, BackendResult};
pub use gcs::GcsBackend;
pub use memory::MemoryBackend;
pub use object::{
    checksum_from_base64, checksum_from_etag, key_to_local, local_to_key, validate_key,
    RemoteObject, TargetInfo, UploadAction,
};
pub use resolve::resolve_target;
pub use s3::S3Backend;

use cairn_core::BackendKind;
use std::sync::Arc;

/// Builds the adapter for `kind` from the provider's credentials.
///
/// # Errors
///
/// Returns [`BackendError::NotAuthenticated`] if the provider has nothing
/// usable for `kind`.
pub async fn connect(
    kind: BackendKind,
    provider: &dyn CredentialProvider,
) -> BackendResult<Arc<dyn RemoteBackend>> {
    let credentials = provider.credentials(kind).await?.ok_or_else(|| {
        BackendError::NotAuthenticated(format!("no credentials configured for {}", kind.label()))
    })?;

    let backend: Arc<dyn RemoteBackend> = match (kind, credentials) {
        (BackendKind::Drive, Credentials::Bearer(token)) => {
            Arc::new(DriveBackend::new(reqwest::Client::new(), token))
        }
        (BackendKind::Gcs, Credentials::Bearer(token)) => {
            Arc::new(GcsBackend::new(reqwest::Client::new(), token))
        }
        (
            BackendKind::S3,
            Credentials::Aws {
                region,
                endpoint_url,
            },
        ) => Arc::new(S3Backend::connect(region, endpoint_url).await),
        (
            BackendKind::Azure,
            Credentials::AzureSas {
                account_url,
                sas_token,
            },
        ) => Arc::new(AzureBackend::new(
            reqwest::Client::new(),
            account_url,
            sas_token,
        )),
        (kind, other) => {
            return Err(BackendError::NotAuthenticated(format!(
                "{other:?} cannot authenticate {}",
                kind.label()
            )))
        }
    };
    tracing::debug!(kind = %kind, "backend connected");
    Ok(backend)
}
