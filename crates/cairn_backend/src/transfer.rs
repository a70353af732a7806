//! Streaming helpers shared by the HTTP adapters.

use crate::error::{BackendError, BackendResult};
use futures::TryStreamExt;
use reqwest::{Body, Response, StatusCode};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::{ReaderStream, StreamReader};
use uuid::Uuid;

/// Hidden sibling that receives bytes until the download completes.
///
/// The random part keeps concurrent downloads of `x` and `x.download` in
/// one directory from sharing a scratch file.
pub(crate) fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or_else(|| OsStr::new("download")));
    name.push(format!(".{}.download", Uuid::new_v4().simple()));
    dest.with_file_name(name)
}

/// Copies `reader` into `dest` through a partial file.
///
/// `dest` only appears once every byte is on disk; on failure the partial
/// file is removed and any existing `dest` is left alone.
pub(crate) async fn save_reader<R>(mut reader: R, dest: &Path) -> BackendResult<u64>
where
    R: AsyncRead + Unpin + Send,
{
    let partial = partial_path(dest);
    let result = async {
        let mut file = File::create(&partial).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&partial, dest).await?;
        Ok::<u64, io::Error>(written)
    }
    .await;

    match result {
        Ok(written) => Ok(written),
        Err(err) => {
            let _ = fs::remove_file(&partial).await;
            Err(BackendError::transfer(format!(
                "writing {}: {err}",
                dest.display()
            )))
        }
    }
}

/// Streams a response body into `dest`.
pub(crate) async fn save_response(response: Response, dest: &Path) -> BackendResult<u64> {
    let stream = response.bytes_stream().map_err(io::Error::other);
    save_reader(StreamReader::new(stream), dest).await
}

/// A streamed request body for `path` and its length.
pub(crate) async fn file_body(path: &Path) -> BackendResult<(Body, u64)> {
    let file = File::open(path).await?;
    let len = file.metadata().await?.len();
    Ok((Body::wrap_stream(ReaderStream::new(file)), len))
}

/// Passes successful responses through and maps the rest to errors.
pub(crate) async fn check_status(response: Response, key: &str) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(status_error(status, key, message))
}

pub(crate) fn status_error(status: StatusCode, key: &str, message: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::NotAuthenticated(
            format!("access to `{key}` denied ({status}): {}", truncate(&message)),
        ),
        StatusCode::NOT_FOUND => BackendError::not_found(key),
        _ => BackendError::Http {
            status: status.as_u16(),
            message: truncate(&message).to_string(),
        },
    }
}

fn truncate(message: &str) -> &str {
    const LIMIT: usize = 300;
    if message.len() <= LIMIT {
        return message;
    }
    let mut end = LIMIT;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_reader_writes_through_partial() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let written = save_reader(&b"payload"[..], &dest).await.unwrap();
        assert_eq!(written, 7);
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn failed_save_keeps_existing_destination() {
        struct Broken;
        impl AsyncRead for Broken {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Err(io::Error::other("connection reset")))
            }
        }

        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        std::fs::write(&dest, b"old").unwrap();
        assert!(save_reader(Broken, &dest).await.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn neighbouring_keys_do_not_share_scratch_files() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("x");
        let suffixed = dir.path().join("x.download");
        let (a, b) = tokio::join!(
            save_reader(&b"plain"[..], &plain),
            save_reader(&b"suffixed"[..], &suffixed)
        );
        assert_eq!(a.unwrap(), 5);
        assert_eq!(b.unwrap(), 8);
        assert_eq!(std::fs::read(&plain).unwrap(), b"plain");
        assert_eq!(std::fs::read(&suffixed).unwrap(), b"suffixed");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn scratch_files_are_hidden_and_unique() {
        let dest = Path::new("/tmp/out.bin");
        let first = partial_path(dest);
        assert_ne!(first, partial_path(dest));
        assert_eq!(first.parent(), dest.parent());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".out.bin."));
        assert!(name.ends_with(".download"));
    }

    #[test]
    fn statuses_map_to_errors() {
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "k", String::new()),
            BackendError::NotAuthenticated(_)
        ));
        assert!(status_error(StatusCode::NOT_FOUND, "k", String::new()).is_not_found());
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "k", "x".repeat(1000)),
            BackendError::Http { status: 502, ref message } if message.len() == 300
        ));
    }
}
