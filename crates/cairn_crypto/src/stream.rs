//! Incremental AES-256-GCM.
//!
//! `aes-gcm` only encrypts whole buffers, but files are transformed chunk by
//! chunk. [`GcmStream`] drives the same primitives (AES-256 in 32-bit
//! big-endian counter mode plus GHASH) incrementally, so its output is
//! byte-identical to one-shot `Aes256Gcm` with no associated data.

use crate::key::EncryptionKey;
use crate::{IV_SIZE, TAG_SIZE};
use aes_gcm::aes::cipher::generic_array::GenericArray;
use aes_gcm::aes::cipher::{BlockEncrypt, KeyInit, KeyIvInit, StreamCipher};
use aes_gcm::aes::{Aes256, Block};
use ghash::universal_hash::{KeyInit as _, UniversalHash};
use ghash::GHash;

const BLOCK_SIZE: usize = 16;

type Aes256Ctr = ctr::Ctr32BE<Aes256>;

/// Streaming AES-256-GCM state for one message.
pub(crate) struct GcmStream {
    keystream: Aes256Ctr,
    ghash: GHash,
    /// Ciphertext bytes not yet folded into GHASH (always < one block).
    pending: Vec<u8>,
    /// `AES_K(IV || 1)`, XORed into the final GHASH value.
    tag_mask: Block,
    ciphertext_len: u64,
}

impl GcmStream {
    pub(crate) fn new(key: &EncryptionKey, iv: &[u8; IV_SIZE]) -> Self {
        let key_bytes = GenericArray::from_slice(key.as_bytes());
        let cipher = Aes256::new(key_bytes);

        let mut hash_key = Block::default();
        cipher.encrypt_block(&mut hash_key);

        let mut counter = [0u8; BLOCK_SIZE];
        counter[..IV_SIZE].copy_from_slice(iv);
        counter[BLOCK_SIZE - 1] = 1;
        let mut tag_mask = Block::clone_from_slice(&counter);
        cipher.encrypt_block(&mut tag_mask);

        counter[BLOCK_SIZE - 1] = 2;
        let keystream = Aes256Ctr::new(key_bytes, GenericArray::from_slice(&counter));

        Self {
            keystream,
            ghash: GHash::new(&hash_key),
            pending: Vec::with_capacity(BLOCK_SIZE),
            tag_mask,
            ciphertext_len: 0,
        }
    }

    /// Encrypts `buf` in place.
    pub(crate) fn encrypt(&mut self, buf: &mut [u8]) {
        self.keystream.apply_keystream(buf);
        self.absorb(buf);
    }

    /// Decrypts `buf` in place. The result is unauthenticated until
    /// [`finalize`](Self::finalize) is compared with the stored tag.
    pub(crate) fn decrypt(&mut self, buf: &mut [u8]) {
        self.absorb(buf);
        self.keystream.apply_keystream(buf);
    }

    fn absorb(&mut self, mut ciphertext: &[u8]) {
        self.ciphertext_len += ciphertext.len() as u64;

        if !self.pending.is_empty() {
            let take = (BLOCK_SIZE - self.pending.len()).min(ciphertext.len());
            self.pending.extend_from_slice(&ciphertext[..take]);
            ciphertext = &ciphertext[take..];
            if self.pending.len() < BLOCK_SIZE {
                return;
            }
            self.ghash.update(&[Block::clone_from_slice(&self.pending)]);
            self.pending.clear();
        }

        let mut blocks = ciphertext.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            self.ghash.update(&[Block::clone_from_slice(block)]);
        }
        self.pending.extend_from_slice(blocks.remainder());
    }

    /// Completes the message and returns its authentication tag.
    pub(crate) fn finalize(mut self) -> [u8; TAG_SIZE] {
        self.ghash.update_padded(&self.pending);

        let mut lengths = [0u8; BLOCK_SIZE];
        lengths[8..].copy_from_slice(&(self.ciphertext_len * 8).to_be_bytes());
        self.ghash.update(&[Block::clone_from_slice(&lengths)]);

        let digest = self.ghash.finalize();
        let mut tag = [0u8; TAG_SIZE];
        for ((out, d), m) in tag.iter_mut().zip(digest.iter()).zip(self.tag_mask.iter()) {
            *out = d ^ m;
        }
        tag
    }
}

/// Compares two tags without early exit.
pub(crate) fn tags_match(a: &[u8; TAG_SIZE], b: &[u8; TAG_SIZE]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
