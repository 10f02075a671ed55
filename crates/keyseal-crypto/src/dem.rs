//! Data encapsulation with ChaCha20-Poly1305
//!
//! Nonce policy: every call to [`DemPrimitive::seal`] draws a fresh random
//! 96-bit nonce from the OS-seeded thread RNG and writes it in front of the
//! AEAD output:
//!
//! ```text
//! nonce (12) || ciphertext || tag (16)
//! ```
//!
//! Through [`HybridEncryptor`](crate::HybridEncryptor) each DEM key is also
//! single-use, since it is derived from a fresh KEM encapsulation.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{DemKey, SECRET_SIZE};

/// Nonce size for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Authenticated symmetric encryption
pub trait DemPrimitive: Send + Sync {
    /// Key size in bytes
    const KEY_SIZE: usize;
    /// Nonce bytes written in front of each output
    const NONCE_SIZE: usize;
    /// Authentication tag size
    const TAG_SIZE: usize;
    /// Bytes added to every plaintext
    const OVERHEAD: usize = Self::NONCE_SIZE + Self::TAG_SIZE;

    /// Encrypt and authenticate `plaintext`, binding `associated_data`
    fn seal(
        &self,
        key: &DemKey,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// Verify and decrypt; fails with [`CryptoError::AuthenticationFailure`]
    fn open(
        &self,
        key: &DemKey,
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> CryptoResult<Vec<u8>>;
}

/// ChaCha20-Poly1305 with random nonces
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaCha20Poly1305Dem;

impl ChaCha20Poly1305Dem {
    pub fn new() -> Self {
        Self
    }
}

impl DemPrimitive for ChaCha20Poly1305Dem {
    const KEY_SIZE: usize = SECRET_SIZE;
    const NONCE_SIZE: usize = NONCE_SIZE;
    const TAG_SIZE: usize = TAG_SIZE;

    fn seal(
        &self,
        key: &DemKey,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: associated_data,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn open(
        &self,
        key: &DemKey,
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        if ciphertext.len() < Self::OVERHEAD {
            return Err(CryptoError::AuthenticationFailure);
        }

        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::AuthenticationFailure)?;

        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(
                nonce,
                Payload {
                    msg: sealed,
                    aad: associated_data,
                },
            )
            .map_err(|_| CryptoError::AuthenticationFailure)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn random_key() -> DemKey {
        let mut bytes = [0u8; SECRET_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        DemKey::from_bytes(bytes)
    }

    #[test]
    fn test_seal_open() {
        let dem = ChaCha20Poly1305Dem::new();
        let key = random_key();

        let sealed = dem.seal(&key, b"Hello, sealed world!", b"aad").unwrap();
        assert_eq!(sealed.len(), 20 + ChaCha20Poly1305Dem::OVERHEAD);

        let opened = dem.open(&key, &sealed, b"aad").unwrap();
        assert_eq!(opened, b"Hello, sealed world!");
    }

    #[test]
    fn test_empty_plaintext() {
        let dem = ChaCha20Poly1305Dem::new();
        let key = random_key();

        let sealed = dem.seal(&key, b"", b"").unwrap();
        assert_eq!(sealed.len(), ChaCha20Poly1305Dem::OVERHEAD);
        assert!(dem.open(&key, &sealed, b"").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_associated_data_fails() {
        let dem = ChaCha20Poly1305Dem::new();
        let key = random_key();

        let sealed = dem.seal(&key, b"payload", b"context-a").unwrap();
        let result = dem.open(&key, &sealed, b"context-b");
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_wrong_key_fails() {
        let dem = ChaCha20Poly1305Dem::new();
        let sealed = dem.seal(&random_key(), b"payload", b"").unwrap();
        let result = dem.open(&random_key(), &sealed, b"");
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let dem = ChaCha20Poly1305Dem::new();
        let key = random_key();

        let sealed = dem.seal(&key, b"payload", b"").unwrap();
        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            let result = dem.open(&key, &tampered, b"");
            assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
        }
    }

    #[test]
    fn test_truncated_input_fails() {
        let dem = ChaCha20Poly1305Dem::new();
        let key = random_key();

        let result = dem.open(&key, &[0u8; ChaCha20Poly1305Dem::OVERHEAD - 1], b"");
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_nonces_never_repeat() {
        let dem = ChaCha20Poly1305Dem::new();
        let key = random_key();

        let mut nonces = HashSet::new();
        for _ in 0..2_000 {
            let sealed = dem.seal(&key, b"same plaintext", b"").unwrap();
            let nonce: [u8; NONCE_SIZE] = sealed[..NONCE_SIZE].try_into().unwrap();
            assert!(nonces.insert(nonce), "nonce repeated");
        }
    }
}
