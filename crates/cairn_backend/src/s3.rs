//! Amazon S3 adapter.

use crate::backend::RemoteBackend;
use crate::error::{BackendError, BackendResult};
use crate::object::{checksum_from_etag, validate_key, RemoteObject, TargetInfo};
use crate::transfer::save_reader;
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use cairn_core::BackendKind;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::path::Path;

/// S3 (or S3-compatible) adapter using the AWS SDK credential chain.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    /// Wraps an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the default AWS chain with optional overrides.
    pub async fn connect(region: Option<String>, endpoint_url: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

fn status_of<E>(err: &SdkError<E>) -> Option<u16> {
    match err {
        SdkError::ServiceError(e) => Some(e.raw().status().as_u16()),
        _ => None,
    }
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
    status_of(err) == Some(404)
}

fn map_sdk_error<E: Debug>(err: SdkError<E>, key: &str) -> BackendError {
    match status_of(&err) {
        Some(404) => BackendError::not_found(key),
        Some(401 | 403) => BackendError::NotAuthenticated(format!("access to `{key}` denied")),
        Some(status) => BackendError::Http {
            status,
            message: format!("{err:?}"),
        },
        None => BackendError::transfer(format!("{err:?}")),
    }
}

fn to_chrono(time: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

#[async_trait]
impl RemoteBackend for S3Backend {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    async fn probe(&self, target: &str) -> BackendResult<()> {
        self.client
            .head_bucket()
            .bucket(target)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, target))?;
        Ok(())
    }

    async fn list(&self, target: &str, prefix: Option<&str>) -> BackendResult<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(target);
            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }
            let output = request
                .send()
                .await
                .map_err(|e| map_sdk_error(e, target))?;

            for obj in output.contents() {
                let Some(key) = obj.key() else { continue };
                if key.ends_with('/') {
                    continue;
                }
                objects.push(RemoteObject {
                    key: key.to_string(),
                    checksum: obj.e_tag().and_then(checksum_from_etag),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj.last_modified().and_then(to_chrono),
                });
            }

            if output.is_truncated() == Some(true) {
                continuation = output.next_continuation_token().map(str::to_string);
                if continuation.is_none() {
                    break;
                }
            } else {
                break;
            }
        }
        tracing::debug!(bucket = target, count = objects.len(), "listed s3 bucket");
        Ok(objects)
    }

    async fn exists(&self, target: &str, key: &str) -> BackendResult<bool> {
        match self.client.head_object().bucket(target).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(map_sdk_error(err, key)),
        }
    }

    async fn put(&self, local: &Path, key: &str, target: &str) -> BackendResult<()> {
        validate_key(key)?;
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| BackendError::transfer(format!("reading {}: {e}", local.display())))?;
        self.client
            .put_object()
            .bucket(target)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    async fn fetch(&self, target: &str, key: &str, dest: &Path) -> BackendResult<u64> {
        let output = self
            .client
            .get_object()
            .bucket(target)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        save_reader(Box::pin(output.body.into_async_read()), dest).await
    }

    async fn remove_object(&self, target: &str, key: &str) -> BackendResult<()> {
        // DeleteObject succeeds for absent keys, so check first.
        if !self.exists(target, key).await? {
            return Err(BackendError::not_found(key));
        }
        self.client
            .delete_object()
            .bucket(target)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    async fn describe_target(&self, target: &str) -> BackendResult<Option<TargetInfo>> {
        self.probe(target).await?;
        Ok(Some(TargetInfo {
            id: target.to_string(),
            name: target.to_string(),
            url: Some(format!("https://s3.console.aws.amazon.com/s3/buckets/{target}")),
        }))
    }
}
