//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use cairn_crypto::{Codec, EncryptionKey};
use rand::RngCore;

/// Payload sizes exercised by every benchmark group.
pub const SIZES: [usize; 4] = [1024, 64 * 1024, 1024 * 1024, 8 * 1024 * 1024];

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

/// A codec with a random key; skips the deliberately slow key derivation.
pub fn random_codec() -> Codec {
    Codec::new(EncryptionKey::generate())
}

/// Human label for a payload size.
pub fn size_label(size: usize) -> String {
    if size >= 1024 * 1024 {
        format!("{}MiB", size / (1024 * 1024))
    } else {
        format!("{}KiB", size / 1024)
    }
}
