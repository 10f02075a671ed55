//! Versioned key material held by a keyset
//!
//! A [`KeyMaterial`] entry pairs a KEM key pair with the identifier that is
//! written in clear at the front of every ciphertext it produces, plus a
//! [`KeyStatus`] that decides whether the key may still be used.
//!
//! ## Security
//!
//! Private keys are wrapped in [`PrivateKey`], which zeroizes its bytes on
//! drop, redacts itself from `Debug` output and compares in constant time.

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Lifecycle state of a key entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    /// Usable for encryption (when primary) and decryption
    Enabled,
    /// Kept for auditing, refused for any cryptographic use
    Disabled,
    /// Key material has been erased; only the id remains
    Destroyed,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            KeyStatus::Enabled => "ENABLED",
            KeyStatus::Disabled => "DISABLED",
            KeyStatus::Destroyed => "DESTROYED",
        };
        f.write_str(label)
    }
}

/// Private KEM key bytes
///
/// Zeroized on drop. Never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    /// Wrap raw private key bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the inner bytes (use with caution)
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Get the length
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// A KEM key pair
///
/// The private half is present only in private keysets.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    public_key: Vec<u8>,
    private_key: Option<PrivateKey>,
}

impl KeyPair {
    /// Create a key pair holding both halves
    pub fn new(public_key: Vec<u8>, private_key: PrivateKey) -> Self {
        Self {
            public_key,
            private_key: Some(private_key),
        }
    }

    /// Create a public-only key pair
    pub fn public_only(public_key: Vec<u8>) -> Self {
        Self {
            public_key,
            private_key: None,
        }
    }

    pub(crate) fn from_parts(public_key: Vec<u8>, private_key: Option<PrivateKey>) -> Self {
        Self {
            public_key,
            private_key,
        }
    }

    /// The public key bytes
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The private key, if this is a private key pair
    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    /// Drop the private half
    pub fn to_public(&self) -> Self {
        Self::public_only(self.public_key.clone())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(&self.public_key))
            .field("has_private_key", &self.private_key.is_some())
            .finish()
    }
}

/// One entry of a keyset
///
/// The key id is fixed at construction; there is no way to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    key_id: u32,
    status: KeyStatus,
    key_pair: Option<KeyPair>,
}

impl KeyMaterial {
    /// Create an entry from a key pair
    ///
    /// A [`KeyStatus::Destroyed`] entry never keeps its key pair.
    pub fn new(key_id: u32, status: KeyStatus, key_pair: KeyPair) -> Self {
        if status == KeyStatus::Destroyed {
            return Self::destroyed(key_id);
        }
        Self {
            key_id,
            status,
            key_pair: Some(key_pair),
        }
    }

    /// Create the record left behind by a destroyed key
    pub fn destroyed(key_id: u32) -> Self {
        Self {
            key_id,
            status: KeyStatus::Destroyed,
            key_pair: None,
        }
    }

    /// Rebuild an entry exactly as stored; checked by [`Keyset::new`](crate::Keyset::new)
    pub(crate) fn from_parts(key_id: u32, status: KeyStatus, key_pair: Option<KeyPair>) -> Self {
        Self {
            key_id,
            status,
            key_pair,
        }
    }

    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    pub fn status(&self) -> KeyStatus {
        self.status
    }

    pub fn key_pair(&self) -> Option<&KeyPair> {
        self.key_pair.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.status == KeyStatus::Enabled
    }

    pub fn public_key(&self) -> Option<&[u8]> {
        self.key_pair.as_ref().map(KeyPair::public_key)
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.key_pair.as_ref().and_then(KeyPair::private_key)
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key().is_some()
    }

    /// Same entry with the private key removed
    pub fn to_public(&self) -> Self {
        Self {
            key_id: self.key_id,
            status: self.status,
            key_pair: self.key_pair.as_ref().map(KeyPair::to_public),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pair() -> KeyPair {
        KeyPair::new(vec![0x11; 32], PrivateKey::new(vec![0x22; 32]))
    }

    #[test]
    fn test_destroyed_entry_clears_key_pair() {
        let entry = KeyMaterial::new(5, KeyStatus::Destroyed, sample_pair());
        assert_eq!(entry.key_id(), 5);
        assert_eq!(entry.status(), KeyStatus::Destroyed);
        assert!(entry.key_pair().is_none());
        assert!(entry.public_key().is_none());
    }

    #[test]
    fn test_to_public_strips_private_key() {
        let entry = KeyMaterial::new(1, KeyStatus::Enabled, sample_pair());
        assert!(entry.has_private_key());

        let public = entry.to_public();
        assert!(!public.has_private_key());
        assert_eq!(public.public_key(), entry.public_key());
        assert_eq!(public.key_id(), 1);
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let key = PrivateKey::new(vec![0xAB; 32]);
        let debug = format!("{:?}", key);
        assert!(!debug.contains("ab"));
        assert!(!debug.contains("171"));
        assert!(debug.contains("PrivateKey"));
    }

    #[test]
    fn test_private_key_equality() {
        assert_eq!(PrivateKey::new(vec![1, 2, 3]), PrivateKey::new(vec![1, 2, 3]));
        assert_ne!(PrivateKey::new(vec![1, 2, 3]), PrivateKey::new(vec![1, 2, 4]));
        assert_ne!(PrivateKey::new(vec![1, 2, 3]), PrivateKey::new(vec![1, 2]));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(KeyStatus::Enabled.to_string(), "ENABLED");
        assert_eq!(KeyStatus::Disabled.to_string(), "DISABLED");
        assert_eq!(KeyStatus::Destroyed.to_string(), "DESTROYED");
    }
}
