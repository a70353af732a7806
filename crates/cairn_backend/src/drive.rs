//! Google Drive (REST v3) adapter.
//!
//! Objects are the non-folder children of the target folder. A file's name
//! is its full forward-slash key, so nested keys stay flat inside the folder.

use crate::backend::RemoteBackend;
use crate::error::{BackendError, BackendResult};
use crate::object::{validate_key, RemoteObject, TargetInfo, UploadAction};
use crate::transfer::{check_status, file_body, save_response};
use async_trait::async_trait;
use cairn_core::BackendKind;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,md5Checksum,size,modifiedTime)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    md5_checksum: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl DriveFile {
    fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME)
    }

    fn into_object(self) -> RemoteObject {
        RemoteObject {
            size: self.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0),
            checksum: self.md5_checksum.map(|c| c.to_ascii_lowercase()),
            last_modified: self.modified_time,
            key: self.name,
        }
    }

    fn into_target(self) -> TargetInfo {
        TargetInfo {
            id: self.id,
            name: self.name,
            url: self.web_view_link,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Escapes a value for a Drive query string literal.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Google Drive adapter authenticated with an OAuth access token.
#[derive(Debug, Clone)]
pub struct DriveBackend {
    client: Client,
    token: String,
    api_base: String,
    upload_base: String,
}

impl DriveBackend {
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

    /// Points the adapter at a different API host.
    #[must_use]
    pub fn with_base_urls(mut self, api: impl Into<String>, upload: impl Into<String>) -> Self {
        self.api_base = api.into();
        self.upload_base = upload.into();
        self
    }

    async fn query(&self, q: &str, page_token: Option<&str>) -> BackendResult<FileList> {
        let mut params = vec![
            ("q", q.to_string()),
            ("fields", LIST_FIELDS.to_string()),
            ("pageSize", "1000".to_string()),
            ("orderBy", "name".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await?;
        Ok(check_status(response, q).await?.json().await?)
    }

    async fn find_file(&self, folder: &str, key: &str) -> BackendResult<Option<DriveFile>> {
        let q = format!(
            "'{}' in parents and name = '{}' and trashed = false",
            quote(folder),
            quote(key)
        );
        let list = self.query(&q, None).await?;
        Ok(list.files.into_iter().find(|f| !f.is_folder()))
    }

    async fn require_file(&self, folder: &str, key: &str) -> BackendResult<DriveFile> {
        self.find_file(folder, key)
            .await?
            .ok_or_else(|| BackendError::not_found(key))
    }

    async fn get_metadata(&self, id: &str) -> BackendResult<DriveFile> {
        let response = self
            .client
            .get(format!("{}/files/{id}", self.api_base))
            .bearer_auth(&self.token)
            .query(&[("fields", "id,name,mimeType,webViewLink")])
            .send()
            .await?;
        Ok(check_status(response, id).await?.json().await?)
    }

    async fn create_metadata(&self, folder: &str, key: &str) -> BackendResult<String> {
        let response = self
            .client
            .post(format!("{}/files", self.api_base))
            .bearer_auth(&self.token)
            .query(&[("fields", "id")])
            .json(&json!({ "name": key, "parents": [folder] }))
            .send()
            .await?;
        let file: DriveFile = check_status(response, key).await?.json().await?;
        Ok(file.id)
    }

    async fn upload_media(&self, id: &str, local: &Path, key: &str) -> BackendResult<()> {
        let (body, len) = file_body(local).await?;
        let response = self
            .client
            .patch(format!("{}/files/{id}", self.upload_base))
            .bearer_auth(&self.token)
            .query(&[("uploadType", "media")])
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str, key: &str) -> BackendResult<()> {
        let response = self
            .client
            .delete(format!("{}/files/{id}", self.api_base))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn create_and_upload(&self, local: &Path, key: &str, folder: &str) -> BackendResult<()> {
        let id = self.create_metadata(folder, key).await?;
        if let Err(err) = self.upload_media(&id, local, key).await {
            // Drop the empty placeholder so a retry starts clean.
            if let Err(cleanup) = self.delete_by_id(&id, key).await {
                tracing::warn!(key, error = %cleanup, "failed to remove placeholder");
            }
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for DriveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Drive
    }

    async fn probe(&self, target: &str) -> BackendResult<()> {
        let folder = self.get_metadata(target).await?;
        if !folder.is_folder() {
            return Err(BackendError::Validation(format!("`{target}` is not a folder")));
        }
        Ok(())
    }

    async fn list(&self, target: &str, prefix: Option<&str>) -> BackendResult<Vec<RemoteObject>> {
        let q = format!("'{}' in parents and trashed = false", quote(target));
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.query(&q, page_token.as_deref()).await?;
            objects.extend(
                page.files
                    .into_iter()
                    .filter(|f| !f.is_folder())
                    .filter(|f| prefix.map_or(true, |p| f.name.starts_with(p)))
                    .map(DriveFile::into_object),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::debug!(folder = target, count = objects.len(), "listed drive folder");
        Ok(objects)
    }

    async fn exists(&self, target: &str, key: &str) -> BackendResult<bool> {
        Ok(self.find_file(target, key).await?.is_some())
    }

    async fn put(&self, local: &Path, key: &str, target: &str) -> BackendResult<()> {
        validate_key(key)?;
        match self.find_file(target, key).await? {
            Some(existing) => self.upload_media(&existing.id, local, key).await,
            None => self.create_and_upload(local, key, target).await,
        }
    }

    // One lookup serves both the action and the file id.
    async fn upload(&self, local: &Path, key: &str, target: &str) -> BackendResult<UploadAction> {
        validate_key(key)?;
        match self.find_file(target, key).await? {
            Some(existing) => {
                self.upload_media(&existing.id, local, key).await?;
                Ok(UploadAction::Updated)
            }
            None => {
                self.create_and_upload(local, key, target).await?;
                Ok(UploadAction::Created)
            }
        }
    }

    async fn fetch(&self, target: &str, key: &str, dest: &Path) -> BackendResult<u64> {
        let file = self.require_file(target, key).await?;
        let response = self
            .client
            .get(format!("{}/files/{}", self.api_base, file.id))
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        save_response(check_status(response, key).await?, dest).await
    }

    async fn remove_object(&self, target: &str, key: &str) -> BackendResult<()> {
        let file = self.require_file(target, key).await?;
        self.delete_by_id(&file.id, key).await
    }

    async fn describe_target(&self, target: &str) -> BackendResult<Option<TargetInfo>> {
        Ok(Some(self.get_metadata(target).await?.into_target()))
    }

    async fn create_target(&self, name: &str) -> BackendResult<TargetInfo> {
        let response = self
            .client
            .post(format!("{}/files", self.api_base))
            .bearer_auth(&self.token)
            .query(&[("fields", "id,name,webViewLink")])
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME }))
            .send()
            .await?;
        let folder: DriveFile = check_status(response, name).await?.json().await?;
        tracing::info!(id = %folder.id, name, "created drive folder");
        Ok(folder.into_target())
    }
}
