//! Credentials from the global state documents and the environment.
//!
//! Environment variables win over stored documents:
//!
//! | kind  | environment | document |
//! |-------|-------------|----------|
//! | drive, gcs | `CAIRN_ACCESS_TOKEN` | `token.json` |
//! | s3    | `AWS_REGION`, `AWS_ENDPOINT_URL` (keys from the AWS chain) | `credentials.json` `aws` |
//! | azure | `AZURE_STORAGE_ACCOUNT_URL`, `AZURE_STORAGE_SAS_TOKEN` | `credentials.json` `azure` |

use async_trait::async_trait;
use cairn_backend::{BackendError, BackendResult, CredentialProvider, Credentials};
use cairn_core::BackendKind;
use cairn_storage::{Document, StateStore, StateStoreExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Stored OAuth token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDocument {
    /// Bearer token.
    #[serde(alias = "access_token")]
    pub access_token: String,
    /// Expiry, if known.
    #[serde(default, alias = "expiry_date", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Stored per-store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsDocument {
    /// S3 settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsSection>,
    /// Azure settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureSection>,
}

/// S3 section of `credentials.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsSection {
    /// Region override.
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint for S3-compatible stores.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Azure section of `credentials.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureSection {
    /// Account endpoint.
    pub account_url: String,
    /// Shared access signature.
    pub sas_token: String,
}

/// Reads credentials on demand.
pub struct StoredCredentials {
    store: Arc<dyn StateStore>,
    env: HashMap<String, String>,
}

impl StoredCredentials {
    /// Reads documents from `store` and variables from the process environment.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self::with_env(store, std::env::vars().collect())
    }

    /// Uses an explicit environment instead of the process one.
    pub fn with_env(store: Arc<dyn StateStore>, env: HashMap<String, String>) -> Self {
        Self { store, env }
    }

    fn var(&self, name: &str) -> Option<String> {
        self.env
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn document(&self) -> BackendResult<CredentialsDocument> {
        let doc = self
            .store
            .read::<CredentialsDocument>(Document::Credentials)
            .map_err(|e| BackendError::NotAuthenticated(format!("unreadable credentials: {e}")))?;
        Ok(doc.unwrap_or_default())
    }

    fn bearer(&self) -> BackendResult<Option<Credentials>> {
        if let Some(token) = self.var("CAIRN_ACCESS_TOKEN") {
            return Ok(Some(Credentials::Bearer(token)));
        }
        let token = self
            .store
            .read::<TokenDocument>(Document::Token)
            .map_err(|e| BackendError::NotAuthenticated(format!("unreadable token: {e}")))?;
        let Some(token) = token else {
            return Ok(None);
        };
        if token.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(BackendError::NotAuthenticated(
                "stored access token has expired".into(),
            ));
        }
        if token.access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Credentials::Bearer(token.access_token)))
    }

    fn aws(&self) -> BackendResult<Option<Credentials>> {
        let section = self.document()?.aws.unwrap_or_default();
        Ok(Some(Credentials::Aws {
            region: self.var("AWS_REGION").or(section.region),
            endpoint_url: self.var("AWS_ENDPOINT_URL").or(section.endpoint_url),
        }))
    }

    fn azure(&self) -> BackendResult<Option<Credentials>> {
        let section = self.document()?.azure;
        let account_url = self
            .var("AZURE_STORAGE_ACCOUNT_URL")
            .or_else(|| section.as_ref().map(|s| s.account_url.clone()));
        let sas_token = self
            .var("AZURE_STORAGE_SAS_TOKEN")
            .or_else(|| section.as_ref().map(|s| s.sas_token.clone()));
        Ok(match (account_url, sas_token) {
            (Some(account_url), Some(sas_token)) => Some(Credentials::AzureSas {
                account_url,
                sas_token,
            }),
            _ => None,
        })
    }
}

#[async_trait]
impl CredentialProvider for StoredCredentials {
    async fn credentials(&self, kind: BackendKind) -> BackendResult<Option<Credentials>> {
        match kind {
            BackendKind::Drive | BackendKind::Gcs => self.bearer(),
            BackendKind::S3 => self.aws(),
            BackendKind::Azure => self.azure(),
        }
    }
}
