//! Azure Blob Storage (REST) adapter authorized by a SAS token.

use crate::backend::RemoteBackend;
use crate::error::{BackendError, BackendResult};
use crate::object::{checksum_from_base64, validate_key, RemoteObject, TargetInfo};
use crate::transfer::{check_status, file_body, save_response, status_error};
use async_trait::async_trait;
use cairn_core::BackendKind;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::path::Path;

const API_VERSION: &str = "2021-08-06";

/// Blob names keep their `/` separators.
const BLOB_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    blobs: Blobs,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Blobs {
    #[serde(rename = "Blob", default)]
    items: Vec<Blob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Blob {
    name: String,
    properties: BlobProperties,
}

#[derive(Debug, Deserialize)]
struct BlobProperties {
    #[serde(rename = "Content-Length", default)]
    content_length: u64,
    #[serde(rename = "Content-MD5", default)]
    content_md5: Option<String>,
    #[serde(rename = "Last-Modified", default)]
    last_modified: Option<String>,
}

impl Blob {
    fn into_object(self) -> RemoteObject {
        RemoteObject {
            checksum: self
                .properties
                .content_md5
                .as_deref()
                .and_then(checksum_from_base64),
            size: self.properties.content_length,
            last_modified: self
                .properties
                .last_modified
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
                .map(|t| t.with_timezone(&Utc)),
            key: self.name,
        }
    }
}

fn parse_listing(xml: &str) -> BackendResult<EnumerationResults> {
    quick_xml::de::from_str(xml)
        .map_err(|e| BackendError::InvalidResponse(format!("blob listing: {e}")))
}

/// Azure Blob adapter.
#[derive(Debug, Clone)]
pub struct AzureBackend {
    client: Client,
    account_url: String,
    sas_token: String,
}

impl AzureBackend {
    /// Creates an adapter for the account at `account_url`.
    #[must_use]
    pub fn new(client: Client, account_url: impl Into<String>, sas_token: impl Into<String>) -> Self {
        let account_url = account_url.into().trim_end_matches('/').to_string();
        let sas_token = sas_token.into().trim_start_matches('?').to_string();
        Self {
            client,
            account_url,
            sas_token,
        }
    }

    fn container_url(&self, container: &str) -> String {
        format!(
            "{}/{}?{}",
            self.account_url,
            utf8_percent_encode(container, NON_ALPHANUMERIC),
            self.sas_token
        )
    }

    fn blob_url(&self, container: &str, key: &str) -> String {
        format!(
            "{}/{}/{}?{}",
            self.account_url,
            utf8_percent_encode(container, NON_ALPHANUMERIC),
            utf8_percent_encode(key, BLOB_NAME),
            self.sas_token
        )
    }

    fn versioned(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("x-ms-version", API_VERSION)
    }
}

#[async_trait]
impl RemoteBackend for AzureBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Azure
    }

    async fn probe(&self, target: &str) -> BackendResult<()> {
        let response = self
            .versioned(self.client.head(self.container_url(target)))
            .query(&[("restype", "container")])
            .send()
            .await?;
        check_status(response, target).await?;
        Ok(())
    }

    async fn list(&self, target: &str, prefix: Option<&str>) -> BackendResult<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut params = vec![("restype", "container".to_string()), ("comp", "list".to_string())];
            if let Some(prefix) = prefix {
                params.push(("prefix", prefix.to_string()));
            }
            if let Some(marker) = &marker {
                params.push(("marker", marker.clone()));
            }
            let response = self
                .versioned(self.client.get(self.container_url(target)))
                .query(&params)
                .send()
                .await?;
            let body = check_status(response, target).await?.text().await?;
            let page = parse_listing(&body)?;
            objects.extend(page.blobs.items.into_iter().map(Blob::into_object));
            match page.next_marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }
        tracing::debug!(container = target, count = objects.len(), "listed azure container");
        Ok(objects)
    }

    async fn exists(&self, target: &str, key: &str) -> BackendResult<bool> {
        let response = self
            .versioned(self.client.head(self.blob_url(target, key)))
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status, key, String::new())),
        }
    }

    async fn put(&self, local: &Path, key: &str, target: &str) -> BackendResult<()> {
        validate_key(key)?;
        let (body, len) = file_body(local).await?;
        let response = self
            .versioned(self.client.put(self.blob_url(target, key)))
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn fetch(&self, target: &str, key: &str, dest: &Path) -> BackendResult<u64> {
        let response = self
            .versioned(self.client.get(self.blob_url(target, key)))
            .send()
            .await?;
        save_response(check_status(response, key).await?, dest).await
    }

    async fn remove_object(&self, target: &str, key: &str) -> BackendResult<()> {
        let response = self
            .versioned(self.client.delete(self.blob_url(target, key)))
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn describe_target(&self, target: &str) -> BackendResult<Option<TargetInfo>> {
        self.probe(target).await?;
        Ok(Some(TargetInfo {
            id: target.to_string(),
            name: target.to_string(),
            url: Some(format!("{}/{}", self.account_url, target)),
        }))
    }
}
