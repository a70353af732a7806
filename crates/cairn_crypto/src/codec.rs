//! File and buffer encryption in the cairn wire format.

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;
use crate::stream::{tags_match, GcmStream};
use crate::{HEADER_SIZE, IV_SIZE, MAGIC, MAGIC_SIZE, TAG_SIZE};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use std::ffi::{OsStr, OsString};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Encrypts and decrypts files with a single derived key.
///
/// The output format is `MAGIC (4) || IV (12) || ciphertext || tag (16)`,
/// with a fresh random IV per file.
///
/// # Example
///
/// ```no_run
/// use cairn_crypto::{Codec, EncryptionKey};
/// use std::path::Path;
///
/// # async fn run() -> cairn_crypto::CryptoResult<()> {
/// let codec = Codec::new(EncryptionKey::generate());
/// codec.encrypt_file(Path::new("notes.txt"), Path::new("notes.enc")).await?;
/// codec.decrypt_file(Path::new("notes.enc"), Path::new("notes.out")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    key: EncryptionKey,
}

impl Codec {
    /// Creates a codec over the given key.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Encrypts an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher rejects the input.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let iv = random_iv();
        let cipher = Aes256Gcm::new(GenericArray::from_slice(self.key.as_bytes()));
        let body = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| CryptoError::Encryption("cipher rejected input".into()))?;

        let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&iv);
        out.extend(body);
        Ok(out)
    }

    /// Decrypts a buffer produced by [`seal`](Self::seal) or
    /// [`encrypt_file`](Self::encrypt_file).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decryption`] if the header is missing, the
    /// input is truncated, or authentication fails.
    pub fn open(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        if !has_magic(data) {
            return Err(CryptoError::not_encrypted());
        }
        if data.len() < HEADER_SIZE + TAG_SIZE {
            return Err(CryptoError::decryption("input too small"));
        }
        let cipher = Aes256Gcm::new(GenericArray::from_slice(self.key.as_bytes()));
        cipher
            .decrypt(Nonce::from_slice(&data[MAGIC_SIZE..HEADER_SIZE]), &data[HEADER_SIZE..])
            .map_err(|_| CryptoError::decryption("authentication failed"))
    }

    /// Streams `source` into an encrypted `dest`. Returns the bytes written.
    ///
    /// The destination stays open until the trailing tag has been written and
    /// synced. On failure the destination is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read or written.
    pub async fn encrypt_file(&self, source: &Path, dest: &Path) -> CryptoResult<u64> {
        let input = File::open(source).await?;
        match self.encrypt_into(input, dest).await {
            Ok(written) => {
                tracing::debug!(source = %source.display(), bytes = written, "file encrypted");
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(dest).await {
                    tracing::debug!(dest = %dest.display(), error = %cleanup, "no partial output to remove");
                }
                Err(e)
            }
        }
    }

    async fn encrypt_into(&self, mut input: File, dest: &Path) -> CryptoResult<u64> {
        let mut output = File::create(dest).await?;

        let iv = random_iv();
        output.write_all(&MAGIC).await?;
        output.write_all(&iv).await?;

        let mut stream = GcmStream::new(&self.key, &iv);
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut written = HEADER_SIZE as u64;
        loop {
            let n = input.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            stream.encrypt(&mut buf[..n]);
            output.write_all(&buf[..n]).await?;
            written += n as u64;
        }

        output.write_all(&stream.finalize()).await?;
        output.flush().await?;
        output.sync_all().await?;
        Ok(written + TAG_SIZE as u64)
    }

    /// Decrypts `source` into `dest`. Returns the plaintext length.
    ///
    /// Plaintext is written to a hidden, uniquely named sibling file and
    /// only renamed onto `dest` after the tag verifies. On any failure the partial file
    /// is removed and `dest` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decryption`] for a missing magic header, a
    /// truncated file, or a tag mismatch (wrong key or tampering).
    pub async fn decrypt_file(&self, source: &Path, dest: &Path) -> CryptoResult<u64> {
        let partial = partial_path(dest);
        match self.decrypt_into(source, &partial).await {
            Ok(len) => {
                if let Err(e) = fs::rename(&partial, dest).await {
                    let _ = fs::remove_file(&partial).await;
                    return Err(e.into());
                }
                tracing::debug!(dest = %dest.display(), bytes = len, "file decrypted");
                Ok(len)
            }
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }

    async fn decrypt_into(&self, source: &Path, partial: &Path) -> CryptoResult<u64> {
        let mut input = File::open(source).await?;
        let len = input.metadata().await?.len();

        let mut magic = [0u8; MAGIC_SIZE];
        if len < MAGIC_SIZE as u64 {
            return Err(CryptoError::not_encrypted());
        }
        input.read_exact(&mut magic).await?;
        if magic != MAGIC {
            return Err(CryptoError::not_encrypted());
        }
        if len < (HEADER_SIZE + TAG_SIZE) as u64 {
            return Err(CryptoError::decryption("file too small to be encrypted"));
        }

        let mut iv = [0u8; IV_SIZE];
        input.read_exact(&mut iv).await?;

        let mut expected = [0u8; TAG_SIZE];
        input.seek(SeekFrom::Start(len - TAG_SIZE as u64)).await?;
        input.read_exact(&mut expected).await?;
        input.seek(SeekFrom::Start(HEADER_SIZE as u64)).await?;

        let body_len = len - (HEADER_SIZE + TAG_SIZE) as u64;
        let mut remaining = body_len;
        let mut output = File::create(partial).await?;
        let mut stream = GcmStream::new(&self.key, &iv);
        let mut buf = vec![0u8; CHUNK_SIZE];
        while remaining > 0 {
            let want = remaining.min(CHUNK_SIZE as u64) as usize;
            input.read_exact(&mut buf[..want]).await?;
            stream.decrypt(&mut buf[..want]);
            output.write_all(&buf[..want]).await?;
            remaining -= want as u64;
        }

        if !tags_match(&stream.finalize(), &expected) {
            return Err(CryptoError::decryption(
                "authentication failed (wrong passphrase or corrupted file)",
            ));
        }

        output.flush().await?;
        output.sync_all().await?;
        Ok(body_len)
    }
}

/// Returns `true` if `data` starts with the magic header.
#[must_use]
pub fn has_magic(data: &[u8]) -> bool {
    data.len() >= MAGIC_SIZE && data[..MAGIC_SIZE] == MAGIC
}

/// Probes the first four bytes of a file for the magic header.
///
/// Unreadable or shorter files report `false`.
pub async fn is_encrypted_file(path: &Path) -> bool {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "magic probe could not open file");
            return false;
        }
    };
    let mut magic = [0u8; MAGIC_SIZE];
    match file.read_exact(&mut magic).await {
        Ok(_) => magic == MAGIC,
        Err(_) => false,
    }
}

fn random_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Hidden, uniquely named sibling of `dest`.
fn partial_path(dest: &Path) -> PathBuf {
    let mut suffix = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut suffix);
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or_else(|| OsStr::new("plain")));
    name.push(format!(".{}.partial", hex::encode(suffix)));
    dest.with_file_name(name)
}
