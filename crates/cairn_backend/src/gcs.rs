//! Google Cloud Storage (JSON API) adapter.

use crate::backend::RemoteBackend;
use crate::error::BackendResult;
use crate::object::{checksum_from_base64, validate_key, RemoteObject, TargetInfo};
use crate::transfer::{check_status, file_body, save_response, status_error};
use async_trait::async_trait;
use cairn_core::BackendKind;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;

const API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcsObject {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    md5_hash: Option<String>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
}

impl GcsObject {
    fn into_object(self) -> RemoteObject {
        RemoteObject {
            checksum: self.md5_hash.as_deref().and_then(checksum_from_base64),
            size: self.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0),
            last_modified: self.updated,
            key: self.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<GcsObject>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// GCS adapter authenticated with an OAuth access token.
#[derive(Debug, Clone)]
pub struct GcsBackend {
    client: Client,
    token: String,
    api_base: String,
    upload_base: String,
}

impl GcsBackend {
    /// Creates an adapter using `token` as the bearer credential.
    #[must_use]
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Points the adapter at a different API host, e.g. an emulator.
    #[must_use]
    pub fn with_base_urls(mut self, api: impl Into<String>, upload: impl Into<String>) -> Self {
        self.api_base = api.into();
        self.upload_base = upload.into();
        self
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.api_base,
            utf8_percent_encode(bucket, NON_ALPHANUMERIC),
            utf8_percent_encode(key, NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl RemoteBackend for GcsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gcs
    }

    async fn probe(&self, target: &str) -> BackendResult<()> {
        let response = self
            .client
            .get(format!(
                "{}/b/{}",
                self.api_base,
                utf8_percent_encode(target, NON_ALPHANUMERIC)
            ))
            .bearer_auth(&self.token)
            .query(&[("fields", "name")])
            .send()
            .await?;
        check_status(response, target).await?;
        Ok(())
    }

    async fn list(&self, target: &str, prefix: Option<&str>) -> BackendResult<Vec<RemoteObject>> {
        let url = format!(
            "{}/b/{}/o",
            self.api_base,
            utf8_percent_encode(target, NON_ALPHANUMERIC)
        );
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params = vec![(
                "fields",
                "nextPageToken,items(name,size,md5Hash,updated)".to_string(),
            )];
            if let Some(prefix) = prefix {
                params.push(("prefix", prefix.to_string()));
            }
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&params)
                .send()
                .await?;
            let page: ObjectList = check_status(response, target).await?.json().await?;
            objects.extend(
                page.items
                    .into_iter()
                    .filter(|o| !o.name.ends_with('/'))
                    .map(GcsObject::into_object),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::debug!(bucket = target, count = objects.len(), "listed gcs bucket");
        Ok(objects)
    }

    async fn exists(&self, target: &str, key: &str) -> BackendResult<bool> {
        let response = self
            .client
            .get(self.object_url(target, key))
            .bearer_auth(&self.token)
            .query(&[("fields", "name")])
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(
                status,
                key,
                response.text().await.unwrap_or_default(),
            )),
        }
    }

    async fn put(&self, local: &Path, key: &str, target: &str) -> BackendResult<()> {
        validate_key(key)?;
        let (body, len) = file_body(local).await?;
        let response = self
            .client
            .post(format!(
                "{}/b/{}/o",
                self.upload_base,
                utf8_percent_encode(target, NON_ALPHANUMERIC)
            ))
            .bearer_auth(&self.token)
            .query(&[("uploadType", "media"), ("name", key)])
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn fetch(&self, target: &str, key: &str, dest: &Path) -> BackendResult<u64> {
        let response = self
            .client
            .get(self.object_url(target, key))
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        save_response(check_status(response, key).await?, dest).await
    }

    async fn remove_object(&self, target: &str, key: &str) -> BackendResult<()> {
        let response = self
            .client
            .delete(self.object_url(target, key))
            .bearer_auth(&self.token)
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
            url: Some(format!(
                "https://console.cloud.google.com/storage/browser/{target}"
            )),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_names_are_fully_encoded() {
        let backend = GcsBackend::new(Client::new(), "t");
        assert_eq!(
            backend.object_url("bkt", "docs/a b.txt"),
            "https://storage.googleapis.com/storage/v1/b/bkt/o/docs%2Fa%20b%2Etxt"
        );
    }

    #[test]
    fn listing_converts_base64_md5() {
        let page: ObjectList = serde_json::from_str(
            r#"{"items": [{"name": "a.txt", "size": "5", "md5Hash": "XUFAKrxLKna5cZ2REBfFkg==",
                          "updated": "2024-05-01T12:00:00.000Z"}]}"#,
        )
        .unwrap();
        assert!(page.next_page_token.is_none());
        let object = page.items.into_iter().next().unwrap().into_object();
        assert_eq!(
            object.checksum.as_deref(),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
        assert_eq!(object.size, 5);
    }

    #[test]
    fn empty_bucket_listing_has_no_items_field() {
        let page: ObjectList = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
    }
}
