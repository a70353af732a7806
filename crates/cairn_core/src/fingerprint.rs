//! Content fingerprints.
//!
//! A fingerprint is the lowercase hex MD5 digest of a file's bytes. It is
//! only used for equality against the checksums remote stores report
//! natively, never as a security boundary. Metadata such as mtime or size
//! plays no part.

use md5::{Digest, Md5};
use std::io;
use std::path::Path;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

/// Fingerprints an in-memory buffer.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Fingerprints a file by streaming it in fixed-size chunks.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub async fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compares a local fingerprint with a checksum reported by a remote.
///
/// Remote checksums are normalized to lowercase hex by the adapters, but a
/// stray case difference is tolerated here.
#[must_use]
pub fn matches_checksum(local: &str, remote: Option<&str>) -> bool {
    remote.is_some_and(|r| !r.is_empty() && r.eq_ignore_ascii_case(local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn known_digests() {
        assert_eq!(fingerprint(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(fingerprint(b"hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(fingerprint(b"world"), "7d793037a0760186574b0282f2f435e7");
    }

    #[tokio::test]
    async fn file_digest_matches_buffer_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i * 7 % 256) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        assert_eq!(fingerprint_file(&path).await.unwrap(), fingerprint(&data));
    }

    #[tokio::test]
    async fn metadata_does_not_matter() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("nested-b.txt");
        std::fs::write(&a, b"same").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        std::fs::write(&b, b"same").unwrap();

        assert_eq!(
            fingerprint_file(&a).await.unwrap(),
            fingerprint_file(&b).await.unwrap()
        );
    }

    #[test]
    fn checksum_comparison() {
        let local = fingerprint(b"hello");
        assert!(matches_checksum(&local, Some("5D41402ABC4B2A76B9719D911017C592")));
        assert!(!matches_checksum(&local, None));
        assert!(!matches_checksum(&local, Some("")));
    }

    proptest! {
        #[test]
        fn deterministic(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
            let a = fingerprint(&bytes);
            prop_assert_eq!(&a, &fingerprint(&bytes));
            prop_assert_eq!(a.len(), 32);
        }
    }
}
