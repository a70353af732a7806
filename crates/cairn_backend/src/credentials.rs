//! The authenticated-client seam.

use crate::error::BackendResult;
use async_trait::async_trait;
use cairn_core::BackendKind;
use std::collections::HashMap;
use std::fmt;

/// A credential handle for one store kind.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth access token (Drive, GCS).
    Bearer(String),
    /// AWS SDK configuration. Keys come from the default provider chain.
    Aws {
        /// Region override.
        region: Option<String>,
        /// Endpoint override for S3-compatible stores.
        endpoint_url: Option<String>,
    },
    /// Azure storage account with a shared access signature.
    AzureSas {
        /// Account endpoint, e.g. `https://acct.blob.core.windows.net`.
        account_url: String,
        /// SAS query string, with or without a leading `?`.
        sas_token: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"[REDACTED]").finish(),
            Self::Aws {
                region,
                endpoint_url,
            } => f
                .debug_struct("Aws")
                .field("region", region)
                .field("endpoint_url", endpoint_url)
                .finish(),
            Self::AzureSas { account_url, .. } => f
                .debug_struct("AzureSas")
                .field("account_url", account_url)
                .field("sas_token", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Supplies credentials for a store kind.
///
/// `None` means the user has not authenticated. Failures are reported
/// upward and never retried.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns credentials for `kind`, if any are configured.
    async fn credentials(&self, kind: BackendKind) -> BackendResult<Option<Credentials>>;
}

/// A fixed set of credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    entries: HashMap<BackendKind, Credentials>,
}

impl StaticCredentials {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds credentials for `kind`.
    #[must_use]
    pub fn with(mut self, kind: BackendKind, credentials: Credentials) -> Self {
        self.entries.insert(kind, credentials);
        self
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self, kind: BackendKind) -> BackendResult<Option<Credentials>> {
        Ok(self.entries.get(&kind).cloned())
    }
}
