//! Keys and passphrase-based key derivation.

use crate::error::{CryptoError, CryptoResult};
use crate::MAGIC;
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the random vault salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Default Argon2 time cost.
pub const DEFAULT_ITERATIONS: u32 = 3;
/// Default Argon2 memory cost in KiB.
pub const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;

/// Symmetric key for the file codec.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generates a new random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeySize {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key as a byte array.
    ///
    /// # Security
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Non-secret key derivation parameters, persisted once per user.
///
/// The passphrase is never stored; only the salt and cost parameters are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    /// Hex-encoded random salt.
    pub salt: String,
    /// Argon2 time cost.
    pub iterations: u32,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
}

fn default_memory_kib() -> u32 {
    DEFAULT_MEMORY_KIB
}

impl Vault {
    /// Creates a vault with a fresh random salt and default costs.
    #[must_use]
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            salt: hex::encode(salt),
            iterations: DEFAULT_ITERATIONS,
            memory_kib: DEFAULT_MEMORY_KIB,
        }
    }

    /// Overrides the cost parameters.
    ///
    /// Low costs are only suitable for tests.
    #[must_use]
    pub fn with_cost(mut self, iterations: u32, memory_kib: u32) -> Self {
        self.iterations = iterations;
        self.memory_kib = memory_kib;
        self
    }

    /// Decodes the salt.
    ///
    /// # Errors
    ///
    /// Returns an error if the salt is not valid hex or is empty.
    pub fn salt_bytes(&self) -> CryptoResult<Vec<u8>> {
        let salt = hex::decode(&self.salt)
            .map_err(|e| CryptoError::InvalidVault(format!("salt is not hex: {e}")))?;
        if salt.is_empty() {
            return Err(CryptoError::InvalidVault("salt is empty".into()));
        }
        Ok(salt)
    }
}

/// Derives the codec key from a passphrase.
///
/// Argon2id over the passphrase, salted with the vault salt followed by
/// [`MAGIC`], producing a 32-byte key. Derivation is deliberately slow;
/// callers derive once per operation and reuse the key.
///
/// # Errors
///
/// Returns an error if the passphrase is empty, the vault is malformed,
/// or Argon2 rejects the parameters.
pub fn derive_key(passphrase: &str, vault: &Vault) -> CryptoResult<EncryptionKey> {
    if passphrase.is_empty() {
        return Err(CryptoError::KeyDerivation("passphrase must not be empty".into()));
    }

    let mut salt = vault.salt_bytes()?;
    salt.extend_from_slice(&MAGIC);

    let params = Params::new(vault.memory_kib, vault.iterations, 1, Some(KEY_SIZE))
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.as_bytes(), &salt, &mut bytes)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let key = EncryptionKey { bytes };
    bytes.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_vault() -> Vault {
        Vault::generate().with_cost(1, 64)
    }

    #[test]
    fn key_debug_is_redacted() {
        let key = EncryptionKey::generate();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&format!("{:?}", key.as_bytes()[0..4].to_vec())));
    }

    #[test]
    fn key_from_bytes_checks_length() {
        assert!(EncryptionKey::from_bytes(&[0u8; 32]).is_ok());
        assert!(matches!(
            EncryptionKey::from_bytes(&[0u8; 16]),
            Err(CryptoError::InvalidKeySize { expected: 32, actual: 16 })
        ));
    }

    #[test]
    fn vault_salts_are_random() {
        let a = Vault::generate();
        let b = Vault::generate();
        assert_ne!(a.salt, b.salt);
        assert_eq!(a.salt_bytes().unwrap().len(), SALT_SIZE);
    }

    #[test]
    fn vault_serializes_camel_case() {
        let vault = cheap_vault();
        let json = serde_json::to_string(&vault).unwrap();
        assert!(json.contains("\"memoryKib\":64"));

        let legacy = r#"{"salt":"00112233445566778899aabbccddeeff","iterations":2}"#;
        let parsed: Vault = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed.memory_kib, DEFAULT_MEMORY_KIB);
    }

    #[test]
    fn derivation_is_deterministic() {
        let vault = cheap_vault();
        let a = derive_key("correct horse", &vault).unwrap();
        let b = derive_key("correct horse", &vault).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn derivation_depends_on_passphrase_and_salt() {
        let vault = cheap_vault();
        let a = derive_key("one", &vault).unwrap();
        let b = derive_key("two", &vault).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());

        let other = cheap_vault();
        let c = derive_key("one", &other).unwrap();
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn empty_passphrase_rejected() {
        assert!(matches!(
            derive_key("", &cheap_vault()),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn malformed_salt_rejected() {
        let mut vault = cheap_vault();
        vault.salt = "zz".into();
        assert!(matches!(
            derive_key("pass", &vault),
            Err(CryptoError::InvalidVault(_))
        ));
    }
}
