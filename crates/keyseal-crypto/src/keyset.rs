//! Keysets: ordered key entries with one primary
//!
//! A [`Keyset`] is immutable once built. [`Keyset::new`] is the only way to
//! obtain one, so every keyset in circulation has passed the structural checks
//! below; the codec funnels decoded data through the same constructor.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{CryptoError, CryptoResult};
use crate::key_material::{KeyMaterial, KeyStatus};

/// An ordered collection of key entries with a designated primary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyset {
    entries: Vec<KeyMaterial>,
    primary_index: usize,
}

impl Keyset {
    /// Build a keyset, validating its structure
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedKeyset`] if:
    /// - there are no entries
    /// - two entries share a key id
    /// - the primary key id does not name an entry, or names a destroyed one
    /// - a destroyed entry still carries key material
    /// - a live entry has no public key
    pub fn new(primary_key_id: u32, entries: Vec<KeyMaterial>) -> CryptoResult<Self> {
        if entries.is_empty() {
            return Err(CryptoError::MalformedKeyset(
                "keyset has no entries".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.key_id()) {
                return Err(CryptoError::MalformedKeyset(format!(
                    "duplicate key id {}",
                    entry.key_id()
                )));
            }
            match (entry.status(), entry.key_pair()) {
                (KeyStatus::Destroyed, Some(_)) => {
                    return Err(CryptoError::MalformedKeyset(format!(
                        "destroyed key {} still has key material",
                        entry.key_id()
                    )));
                }
                (KeyStatus::Enabled | KeyStatus::Disabled, None) => {
                    return Err(CryptoError::MalformedKeyset(format!(
                        "key {} has no key material",
                        entry.key_id()
                    )));
                }
                (KeyStatus::Enabled | KeyStatus::Disabled, Some(pair))
                    if pair.public_key().is_empty() =>
                {
                    return Err(CryptoError::MalformedKeyset(format!(
                        "key {} has an empty public key",
                        entry.key_id()
                    )));
                }
                _ => {}
            }
        }

        let primary_index = entries
            .iter()
            .position(|e| e.key_id() == primary_key_id)
            .ok_or_else(|| {
                CryptoError::MalformedKeyset(format!(
                    "primary key id {} does not match any entry",
                    primary_key_id
                ))
            })?;
        if entries[primary_index].status() == KeyStatus::Destroyed {
            return Err(CryptoError::MalformedKeyset(format!(
                "primary key {} is destroyed",
                primary_key_id
            )));
        }

        Ok(Self {
            entries,
            primary_index,
        })
    }

    pub fn primary_key_id(&self) -> u32 {
        self.primary().key_id()
    }

    /// All entries in insertion order, including disabled and destroyed ones
    pub fn entries(&self) -> &[KeyMaterial] {
        &self.entries
    }

    /// Look up an entry by key id
    pub fn get(&self, key_id: u32) -> Option<&KeyMaterial> {
        self.entries.iter().find(|e| e.key_id() == key_id)
    }

    /// The primary entry
    pub fn primary(&self) -> &KeyMaterial {
        &self.entries[self.primary_index]
    }

    /// Whether any entry carries a private key
    pub fn has_private_keys(&self) -> bool {
        self.entries.iter().any(KeyMaterial::has_private_key)
    }

    /// Copy of this keyset with every private key removed
    pub fn public_keyset(&self) -> Keyset {
        Keyset {
            entries: self.entries.iter().map(KeyMaterial::to_public).collect(),
            primary_index: self.primary_index,
        }
    }

    /// Audit listing of the entries without any key material
    pub fn info(&self) -> KeysetInfo {
        KeysetInfo {
            primary_key_id: self.primary_key_id(),
            keys: self
                .entries
                .iter()
                .map(|e| KeyInfo {
                    key_id: e.key_id(),
                    status: e.status(),
                    has_private_key: e.has_private_key(),
                })
                .collect(),
        }
    }
}

/// Description of a keyset safe to log or display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysetInfo {
    pub primary_key_id: u32,
    pub keys: Vec<KeyInfo>,
}

/// Description of one keyset entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub key_id: u32,
    pub status: KeyStatus,
    pub has_private_key: bool,
}
