//! Keyset provisioning
//!
//! Generates fresh key pairs and assembles them into a validated [`Keyset`].
//! Encryption and decryption never call into this module; it exists for
//! tooling (the `generate` command) and tests.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{CryptoError, CryptoResult};
use crate::kem::{KemPrimitive, X25519HkdfSha256Kem};
use crate::key_material::{KeyMaterial, KeyStatus};
use crate::keyset::Keyset;

/// Pick a random non-zero key id not present in `taken`
pub fn random_key_id(taken: &HashSet<u32>) -> u32 {
    let mut rng = rand::rng();
    loop {
        let candidate: u32 = rng.random();
        if candidate != 0 && !taken.contains(&candidate) {
            return candidate;
        }
    }
}

/// Builder for new keysets
///
/// ```rust,ignore
/// let keyset = KeysetBuilder::new()
///     .add_key(7, KeyStatus::Enabled)
///     .add_key(8, KeyStatus::Disabled)
///     .primary(7)
///     .build()?;
/// ```
pub struct KeysetBuilder<K: KemPrimitive = X25519HkdfSha256Kem> {
    kem: K,
    entries: Vec<KeyMaterial>,
    primary_key_id: Option<u32>,
}

impl KeysetBuilder {
    /// Builder generating X25519 key pairs
    pub fn new() -> Self {
        Self::with_kem(X25519HkdfSha256Kem::new())
    }
}

impl Default for KeysetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KemPrimitive> KeysetBuilder<K> {
    /// Builder generating key pairs with `kem`
    pub fn with_kem(kem: K) -> Self {
        Self {
            kem,
            entries: Vec::new(),
            primary_key_id: None,
        }
    }

    /// Generate a key pair under `key_id`
    pub fn add_key(mut self, key_id: u32, status: KeyStatus) -> Self {
        let pair = self.kem.generate_key_pair();
        self.entries.push(KeyMaterial::new(key_id, status, pair));
        self
    }

    /// Generate a key pair under a fresh random key id
    pub fn add_random_key(self, status: KeyStatus) -> Self {
        let taken: HashSet<u32> = self.entries.iter().map(KeyMaterial::key_id).collect();
        let key_id = random_key_id(&taken);
        self.add_key(key_id, status)
    }

    /// Choose the primary key; defaults to the first enabled entry
    pub fn primary(mut self, key_id: u32) -> Self {
        self.primary_key_id = Some(key_id);
        self
    }

    /// Validate and build the keyset
    pub fn build(self) -> CryptoResult<Keyset> {
        let primary_key_id = match self.primary_key_id {
            Some(id) => id,
            None => self
                .entries
                .iter()
                .find(|e| e.is_enabled())
                .map(KeyMaterial::key_id)
                .ok_or_else(|| {
                    CryptoError::MalformedKeyset("no enabled key to make primary".to_string())
                })?,
        };
        Keyset::new(primary_key_id, self.entries)
    }
}

/// Generate a private keyset of `key_count` enabled keys with random ids
///
/// The first generated key is primary.
pub fn generate_keyset(key_count: usize) -> CryptoResult<Keyset> {
    if key_count == 0 {
        return Err(CryptoError::MalformedKeyset(
            "key count must be at least 1".to_string(),
        ));
    }
    let mut builder = KeysetBuilder::new();
    for _ in 0..key_count {
        builder = builder.add_random_key(KeyStatus::Enabled);
    }
    builder.build()
}
