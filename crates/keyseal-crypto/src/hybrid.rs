//! Hybrid encryption bound to a keyset
//!
//! [`HybridEncryptor`] and [`HybridDecryptor`] compose a [`KemPrimitive`] and a
//! [`DemPrimitive`] over a shared, immutable [`Keyset`]. Both are generic over
//! the two primitives and default to X25519/HKDF-SHA256 + ChaCha20-Poly1305.
//!
//! ## Ciphertext Format
//!
//! ```text
//! key_id (4, big-endian) || encapsulated_key (32) || nonce (12) || ciphertext || tag (16)
//! ```
//!
//! The key id is not encrypted. It selects the single keyset entry that is
//! allowed to decrypt the ciphertext.
//!
//! ## Failure Reporting
//!
//! Apart from a too-short input, every decryption failure (unknown key,
//! disabled key, bad encapsulated key, tag mismatch, wrong context info) is
//! reported as the same [`CryptoError::DecryptionFailed`]. A ciphertext naming
//! an unknown or unusable key still goes through decapsulation, key derivation
//! and AEAD verification, under a per-decryptor decoy key.

use std::sync::Arc;

use crate::dem::{ChaCha20Poly1305Dem, DemPrimitive};
use crate::error::{CryptoError, CryptoResult};
use crate::kdf;
use crate::kem::{KemPrimitive, X25519HkdfSha256Kem};
use crate::key_material::PrivateKey;
use crate::keyset::Keyset;

/// Size of the key id prefix
pub const KEY_ID_SIZE: usize = 4;

/// Read the key id prefix of a ciphertext
pub fn ciphertext_key_id(ciphertext: &[u8]) -> CryptoResult<u32> {
    let prefix: [u8; KEY_ID_SIZE] = ciphertext
        .get(..KEY_ID_SIZE)
        .and_then(|p| p.try_into().ok())
        .ok_or(CryptoError::MalformedCiphertext {
            expected: KEY_ID_SIZE,
            actual: ciphertext.len(),
        })?;
    Ok(u32::from_be_bytes(prefix))
}

/// Encrypts to the primary key of a keyset
pub struct HybridEncryptor<K = X25519HkdfSha256Kem, D = ChaCha20Poly1305Dem> {
    keyset: Arc<Keyset>,
    kem: K,
    dem: D,
}

impl HybridEncryptor {
    /// Encryptor using X25519 and ChaCha20-Poly1305
    pub fn new(keyset: impl Into<Arc<Keyset>>) -> CryptoResult<Self> {
        Self::with_primitives(keyset, X25519HkdfSha256Kem::new(), ChaCha20Poly1305Dem::new())
    }
}

impl<K: KemPrimitive, D: DemPrimitive> HybridEncryptor<K, D> {
    /// Encryptor using the given primitives
    ///
    /// # Errors
    ///
    /// [`CryptoError::NoUsableKey`] if the primary key is not enabled or its
    /// public key is rejected by the KEM.
    pub fn with_primitives(
        keyset: impl Into<Arc<Keyset>>,
        kem: K,
        dem: D,
    ) -> CryptoResult<Self> {
        let keyset = keyset.into();
        let primary = keyset.primary();

        if !primary.is_enabled() {
            return Err(CryptoError::NoUsableKey(format!(
                "primary key {} is {}",
                primary.key_id(),
                primary.status()
            )));
        }
        let public_key = primary.public_key().ok_or_else(|| {
            CryptoError::NoUsableKey(format!("primary key {} has no public key", primary.key_id()))
        })?;
        kem.check_public_key(public_key).map_err(|e| {
            CryptoError::NoUsableKey(format!("primary key {}: {}", primary.key_id(), e))
        })?;

        Ok(Self { keyset, kem, dem })
    }

    pub fn keyset(&self) -> &Keyset {
        &self.keyset
    }

    /// The key id written into new ciphertexts
    pub fn primary_key_id(&self) -> u32 {
        self.keyset.primary_key_id()
    }

    /// Encrypt `plaintext`, binding it to `context_info`
    ///
    /// The same `context_info` must be supplied to decrypt.
    pub fn encrypt(&self, plaintext: &[u8], context_info: &[u8]) -> CryptoResult<Vec<u8>> {
        let primary = self.keyset.primary();
        let public_key = primary.public_key().ok_or_else(|| {
            CryptoError::NoUsableKey(format!("primary key {} has no public key", primary.key_id()))
        })?;

        let (encapsulated_key, shared_secret) = self.kem.encapsulate(public_key)?;
        let dem_key = kdf::derive_dem_key(&shared_secret, context_info)?;
        let sealed = self.dem.seal(&dem_key, plaintext, context_info)?;

        let mut out = Vec::with_capacity(KEY_ID_SIZE + encapsulated_key.len() + sealed.len());
        out.extend_from_slice(&primary.key_id().to_be_bytes());
        out.extend_from_slice(&encapsulated_key);
        out.extend_from_slice(&sealed);

        tracing::debug!(
            key_id = primary.key_id(),
            plaintext_len = plaintext.len(),
            ciphertext_len = out.len(),
            "hybrid encrypt"
        );

        Ok(out)
    }
}

/// Decrypts ciphertexts produced under any enabled key of a keyset
pub struct HybridDecryptor<K = X25519HkdfSha256Kem, D = ChaCha20Poly1305Dem> {
    keyset: Arc<Keyset>,
    kem: K,
    dem: D,
    decoy: PrivateKey,
}

impl HybridDecryptor {
    /// Decryptor using X25519 and ChaCha20-Poly1305
    pub fn new(keyset: impl Into<Arc<Keyset>>) -> CryptoResult<Self> {
        Self::with_primitives(keyset, X25519HkdfSha256Kem::new(), ChaCha20Poly1305Dem::new())
    }
}

impl<K: KemPrimitive, D: DemPrimitive> HybridDecryptor<K, D> {
    /// Decryptor using the given primitives
    ///
    /// # Errors
    ///
    /// [`CryptoError::NoUsableKey`] if the primary key is not enabled or no
    /// enabled entry carries a private key.
    pub fn with_primitives(
        keyset: impl Into<Arc<Keyset>>,
        kem: K,
        dem: D,
    ) -> CryptoResult<Self> {
        let keyset = keyset.into();
        let primary = keyset.primary();
        if !primary.is_enabled() {
            return Err(CryptoError::NoUsableKey(format!(
                "keyset has no enabled primary: key {} is {}",
                primary.key_id(),
                primary.status()
            )));
        }
        let usable = keyset
            .entries()
            .iter()
            .any(|e| e.is_enabled() && e.has_private_key());
        if !usable {
            return Err(CryptoError::NoUsableKey(
                "keyset has no enabled private key".to_string(),
            ));
        }

        let decoy = kem
            .generate_key_pair()
            .private_key()
            .cloned()
            .ok_or_else(|| {
                CryptoError::KeyDerivationFailed("KEM returned no private key".to_string())
            })?;

        Ok(Self {
            keyset,
            kem,
            dem,
            decoy,
        })
    }

    pub fn keyset(&self) -> &Keyset {
        &self.keyset
    }

    /// Smallest ciphertext this decryptor can accept (empty plaintext)
    pub fn min_ciphertext_len() -> usize {
        KEY_ID_SIZE + K::ENCAPSULATED_KEY_SIZE + D::OVERHEAD
    }

    /// Decrypt a ciphertext produced by [`HybridEncryptor::encrypt`]
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MalformedCiphertext`] if the input is too short
    /// - [`CryptoError::DecryptionFailed`] for every other failure
    pub fn decrypt(&self, ciphertext: &[u8], context_info: &[u8]) -> CryptoResult<Vec<u8>> {
        let min_len = Self::min_ciphertext_len();
        if ciphertext.len() < min_len {
            return Err(CryptoError::MalformedCiphertext {
                expected: min_len,
                actual: ciphertext.len(),
            });
        }

        let key_id = ciphertext_key_id(ciphertext)?;
        match self.decrypt_with_key(key_id, &ciphertext[KEY_ID_SIZE..], context_info) {
            Ok(plaintext) => {
                tracing::debug!(key_id, plaintext_len = plaintext.len(), "hybrid decrypt");
                Ok(plaintext)
            }
            Err(e) => {
                tracing::debug!(key_id, reason = failure_reason(&e), "hybrid decrypt failed");
                Err(CryptoError::DecryptionFailed)
            }
        }
    }

    fn decrypt_with_key(
        &self,
        key_id: u32,
        body: &[u8],
        context_info: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let (encapsulated_key, sealed) = body.split_at(K::ENCAPSULATED_KEY_SIZE);
        match self.private_key_for(key_id) {
            Ok(private_key) => self.open_with(private_key, encapsulated_key, sealed, context_info),
            Err(e) => {
                let _ = self.open_with(&self.decoy, encapsulated_key, sealed, context_info);
                Err(e)
            }
        }
    }

    fn private_key_for(&self, key_id: u32) -> CryptoResult<&PrivateKey> {
        let entry = self
            .keyset
            .get(key_id)
            .ok_or(CryptoError::UnknownKey(key_id))?;
        if !entry.is_enabled() {
            return Err(CryptoError::KeyDisabled {
                key_id,
                status: entry.status(),
            });
        }
        entry
            .private_key()
            .ok_or_else(|| CryptoError::InvalidKey(format!("key {} has no private key", key_id)))
    }

    fn open_with(
        &self,
        private_key: &PrivateKey,
        encapsulated_key: &[u8],
        sealed: &[u8],
        context_info: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let shared_secret = self.kem.decapsulate(private_key, encapsulated_key)?;
        let dem_key = kdf::derive_dem_key(&shared_secret, context_info)?;
        self.dem.open(&dem_key, sealed, context_info)
    }
}

fn failure_reason(err: &CryptoError) -> &'static str {
    match err {
        CryptoError::UnknownKey(_) => "unknown_key",
        CryptoError::KeyDisabled { .. } => "key_disabled",
        CryptoError::InvalidKey(_) => "invalid_key",
        CryptoError::InvalidCiphertext(_) => "invalid_ciphertext",
        CryptoError::AuthenticationFailure => "authentication_failure",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_material::{KeyMaterial, KeyStatus};
    use crate::keygen::KeysetBuilder;

    fn keyset_with(key_id: u32) -> Keyset {
        KeysetBuilder::new()
            .add_key(key_id, KeyStatus::Enabled)
            .build()
            .unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let keyset = Arc::new(keyset_with(7));
        let encryptor = HybridEncryptor::new(keyset.clone()).unwrap();
        let decryptor = HybridDecryptor::new(keyset).unwrap();

        let ciphertext = encryptor.encrypt(b"hello", b"ctx").unwrap();
        assert_eq!(decryptor.decrypt(&ciphertext, b"ctx").unwrap(), b"hello");

        let result = decryptor.decrypt(&ciphertext, b"other");
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_ciphertext_layout() {
        let keyset = keyset_with(0x0102_0304);
        let encryptor = HybridEncryptor::new(keyset).unwrap();

        let ciphertext = encryptor.encrypt(b"abc", b"").unwrap();
        assert_eq!(&ciphertext[..KEY_ID_SIZE], &[1, 2, 3, 4]);
        assert_eq!(ciphertext_key_id(&ciphertext).unwrap(), 0x0102_0304);
        assert_eq!(
            ciphertext.len(),
            HybridDecryptor::<X25519HkdfSha256Kem, ChaCha20Poly1305Dem>::min_ciphertext_len() + 3
        );
    }

    #[test]
    fn test_min_ciphertext_len() {
        assert_eq!(
            HybridDecryptor::<X25519HkdfSha256Kem, ChaCha20Poly1305Dem>::min_ciphertext_len(),
            64
        );
    }

    #[test]
    fn test_empty_plaintext_and_context() {
        let keyset = Arc::new(keyset_with(1));
        let encryptor = HybridEncryptor::new(keyset.clone()).unwrap();
        let decryptor = HybridDecryptor::new(keyset).unwrap();

        let ciphertext = encryptor.encrypt(b"", b"").unwrap();
        assert_eq!(ciphertext.len(), 64);
        assert!(decryptor.decrypt(&ciphertext, b"").unwrap().is_empty());
    }

    #[test]
    fn test_short_ciphertext_is_malformed() {
        let decryptor = HybridDecryptor::new(keyset_with(1)).unwrap();
        let result = decryptor.decrypt(&[0u8; 63], b"");
        assert!(matches!(
            result,
            Err(CryptoError::MalformedCiphertext { expected: 64, actual: 63 })
        ));
    }

    #[test]
    fn test_encryptor_requires_enabled_primary() {
        let keyset = KeysetBuilder::new()
            .add_key(1, KeyStatus::Disabled)
            .add_key(2, KeyStatus::Enabled)
            .primary(1)
            .build()
            .unwrap();
        let result = HybridEncryptor::new(keyset);
        assert!(matches!(result, Err(CryptoError::NoUsableKey(_))));
    }

    #[test]
    fn test_decryptor_requires_enabled_primary() {
        let keyset = KeysetBuilder::new()
            .add_key(1, KeyStatus::Disabled)
            .add_key(2, KeyStatus::Enabled)
            .primary(1)
            .build()
            .unwrap();
        let result = HybridDecryptor::new(keyset);
        assert!(matches!(result, Err(CryptoError::NoUsableKey(_))));
    }

    #[test]
    fn test_unusable_key_fails_like_bad_tag() {
        let keyset = Arc::new(
            KeysetBuilder::new()
                .add_key(1, KeyStatus::Enabled)
                .add_key(2, KeyStatus::Disabled)
                .primary(1)
                .build()
                .unwrap(),
        );
        let decryptor = HybridDecryptor::new(keyset.clone()).unwrap();
        let ciphertext = HybridEncryptor::new(keyset).unwrap().encrypt(b"m", b"").unwrap();

        let mut unknown = ciphertext.clone();
        unknown[..KEY_ID_SIZE].copy_from_slice(&99u32.to_be_bytes());
        let mut disabled = ciphertext.clone();
        disabled[..KEY_ID_SIZE].copy_from_slice(&2u32.to_be_bytes());
        let mut bad_tag = ciphertext;
        let last = bad_tag.len() - 1;
        bad_tag[last] ^= 0x80;

        for input in [unknown, disabled, bad_tag] {
            assert!(matches!(
                decryptor.decrypt(&input, b""),
                Err(CryptoError::DecryptionFailed)
            ));
        }
        assert!(decryptor.private_key_for(99).is_err());
        assert!(decryptor.private_key_for(2).is_err());
        assert!(decryptor.private_key_for(1).is_ok());
    }

    #[test]
    fn test_encryptor_rejects_low_order_primary() {
        let keyset = Keyset::new(
            1,
            vec![KeyMaterial::new(
                1,
                KeyStatus::Enabled,
                crate::key_material::KeyPair::public_only(vec![0u8; 32]),
            )],
        )
        .unwrap();
        let result = HybridEncryptor::new(keyset);
        assert!(matches!(result, Err(CryptoError::NoUsableKey(_))));
    }

    #[test]
    fn test_decryptor_requires_enabled_private_key() {
        let public_only = keyset_with(1).public_keyset();
        assert!(matches!(
            HybridDecryptor::new(public_only),
            Err(CryptoError::NoUsableKey(_))
        ));

        let disabled_only = KeysetBuilder::new()
            .add_key(1, KeyStatus::Disabled)
            .primary(1)
            .build()
            .unwrap();
        assert!(matches!(
            HybridDecryptor::new(disabled_only),
            Err(CryptoError::NoUsableKey(_))
        ));
    }

    #[test]
    fn test_public_keyset_can_encrypt() {
        let private = Arc::new(keyset_with(3));
        let encryptor = HybridEncryptor::new(private.public_keyset()).unwrap();
        let decryptor = HybridDecryptor::new(private).unwrap();

        let ciphertext = encryptor.encrypt(b"for the key holder", b"ctx").unwrap();
        assert_eq!(
            decryptor.decrypt(&ciphertext, b"ctx").unwrap(),
            b"for the key holder"
        );
    }

    #[test]
    fn test_failure_reason_labels() {
        assert_eq!(failure_reason(&CryptoError::UnknownKey(1)), "unknown_key");
        assert_eq!(
            failure_reason(&CryptoError::KeyDisabled {
                key_id: 1,
                status: KeyStatus::Disabled
            }),
            "key_disabled"
        );
        assert_eq!(
            failure_reason(&CryptoError::AuthenticationFailure),
            "authentication_failure"
        );
    }
}
