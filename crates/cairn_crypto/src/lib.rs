//! # Cairn Crypto
//!
//! Client-side encryption applied transparently to transfers.
//!
//! ## Security Model
//!
//! - AES-256-GCM with a fresh random 96-bit IV per file
//! - Keys derived from a passphrase with Argon2id; only the salt and cost
//!   parameters ([`Vault`]) are persisted
//! - Keys are zeroized on drop and redacted from `Debug`
//! - Decrypted output is only exposed after the tag verifies
//!
//! ## Wire Format
//!
//! ```text
//! MAGIC (4) | IV (12) | ciphertext (n) | tag (16)
//! ```
//!
//! Files are transformed in 64 KiB chunks; the tag is appended last. The
//! result is identical to one-shot AES-256-GCM with no associated data.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod key;
mod stream;

pub use codec::{has_magic, is_encrypted_file, Codec};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, EncryptionKey, Vault, DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, KEY_SIZE, SALT_SIZE,
};

/// Marker at the start of every encrypted file.
pub const MAGIC: [u8; 4] = *b"CAIR";
/// Size of [`MAGIC`].
pub const MAGIC_SIZE: usize = MAGIC.len();
/// Size of the GCM nonce.
pub const IV_SIZE: usize = 12;
/// Size of the GCM tag.
pub const TAG_SIZE: usize = 16;
/// Bytes preceding the ciphertext.
pub const HEADER_SIZE: usize = MAGIC_SIZE + IV_SIZE;
