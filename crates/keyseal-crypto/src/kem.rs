//! Key encapsulation
//!
//! [`KemPrimitive`] is the asymmetric half of the hybrid construction. The
//! shipped implementation, [`X25519HkdfSha256Kem`], follows the DHKEM shape:
//! an ephemeral X25519 key is generated per encapsulation, its public half is
//! the encapsulated key, and the Diffie-Hellman output is run through
//! HKDF-SHA256 together with both public keys.
//!
//! ## Key Sizes
//!
//! - Public key: 32 bytes
//! - Private key: 32 bytes
//! - Encapsulated key: 32 bytes
//! - Shared secret: 32 bytes
//!
//! ## Security
//!
//! Scalar multiplication is performed by `x25519-dalek` and is constant time
//! with respect to the private key. Low-order points are rejected by checking
//! that the Diffie-Hellman output is contributory, so a malicious public key
//! or encapsulated key can never force a known all-zero shared secret.

use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{self, SharedSecret};
use crate::key_material::{KeyPair, PrivateKey};

/// Size of an X25519 public key
pub const X25519_PUBLIC_KEY_SIZE: usize = 32;

/// Size of an X25519 private key
pub const X25519_PRIVATE_KEY_SIZE: usize = 32;

/// Scalar used to test public keys for small order. Clamping makes every
/// X25519 scalar a multiple of the cofactor, so any scalar maps a low-order
/// point to zero.
const ORDER_CHECK_SCALAR: [u8; 32] = [0x5a; 32];

/// Key encapsulation mechanism
pub trait KemPrimitive: Send + Sync {
    /// Size of encoded public keys
    const PUBLIC_KEY_SIZE: usize;
    /// Size of encoded private keys
    const PRIVATE_KEY_SIZE: usize;
    /// Size of the encapsulated key written into each ciphertext
    const ENCAPSULATED_KEY_SIZE: usize;

    /// Generate a fresh key pair
    fn generate_key_pair(&self) -> KeyPair;

    /// Check that a public key can be encapsulated to
    fn check_public_key(&self, public_key: &[u8]) -> CryptoResult<()>;

    /// Encapsulate a fresh shared secret to `public_key`
    ///
    /// Returns the encapsulated key and the shared secret.
    fn encapsulate(&self, public_key: &[u8]) -> CryptoResult<(Vec<u8>, SharedSecret)>;

    /// Recover the shared secret from an encapsulated key
    fn decapsulate(
        &self,
        private_key: &PrivateKey,
        encapsulated_key: &[u8],
    ) -> CryptoResult<SharedSecret>;
}

/// X25519 DHKEM with HKDF-SHA256 secret extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct X25519HkdfSha256Kem;

impl X25519HkdfSha256Kem {
    pub fn new() -> Self {
        Self
    }

    fn parse_public_key(public_key: &[u8]) -> CryptoResult<PublicKey> {
        let bytes: [u8; X25519_PUBLIC_KEY_SIZE] = public_key.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "Invalid public key size: expected {}, got {}",
                X25519_PUBLIC_KEY_SIZE,
                public_key.len()
            ))
        })?;
        Ok(PublicKey::from(bytes))
    }

    fn parse_private_key(private_key: &PrivateKey) -> CryptoResult<StaticSecret> {
        let bytes: Zeroizing<[u8; X25519_PRIVATE_KEY_SIZE]> = Zeroizing::new(
            private_key.as_slice().try_into().map_err(|_| {
                CryptoError::InvalidKey(format!(
                    "Invalid private key size: expected {}, got {}",
                    X25519_PRIVATE_KEY_SIZE,
                    private_key.len()
                ))
            })?,
        );
        Ok(StaticSecret::from(*bytes))
    }

    fn random_secret() -> StaticSecret {
        let mut bytes = Zeroizing::new([0u8; X25519_PRIVATE_KEY_SIZE]);
        rand::rng().fill_bytes(&mut *bytes);
        StaticSecret::from(*bytes)
    }
}

impl KemPrimitive for X25519HkdfSha256Kem {
    const PUBLIC_KEY_SIZE: usize = X25519_PUBLIC_KEY_SIZE;
    const PRIVATE_KEY_SIZE: usize = X25519_PRIVATE_KEY_SIZE;
    const ENCAPSULATED_KEY_SIZE: usize = X25519_PUBLIC_KEY_SIZE;

    fn generate_key_pair(&self) -> KeyPair {
        let secret = Self::random_secret();
        let public = PublicKey::from(&secret);
        KeyPair::new(
            public.as_bytes().to_vec(),
            PrivateKey::new(secret.to_bytes().to_vec()),
        )
    }

    fn check_public_key(&self, public_key: &[u8]) -> CryptoResult<()> {
        let public = Self::parse_public_key(public_key)?;
        let shared = StaticSecret::from(ORDER_CHECK_SCALAR).diffie_hellman(&public);
        if !shared.was_contributory() {
            return Err(CryptoError::InvalidKey(
                "Public key is a low-order point".to_string(),
            ));
        }
        Ok(())
    }

    fn encapsulate(&self, public_key: &[u8]) -> CryptoResult<(Vec<u8>, SharedSecret)> {
        let recipient = Self::parse_public_key(public_key)?;

        let ephemeral = Self::random_secret();
        let encapsulated_key = PublicKey::from(&ephemeral);
        let dh = ephemeral.diffie_hellman(&recipient);
        if !dh.was_contributory() {
            return Err(CryptoError::InvalidKey(
                "Public key is a low-order point".to_string(),
            ));
        }

        let shared_secret = kdf::extract_shared_secret(
            dh.as_bytes(),
            encapsulated_key.as_bytes(),
            recipient.as_bytes(),
        )?;

        Ok((encapsulated_key.as_bytes().to_vec(), shared_secret))
    }

    fn decapsulate(
        &self,
        private_key: &PrivateKey,
        encapsulated_key: &[u8],
    ) -> CryptoResult<SharedSecret> {
        let secret = Self::parse_private_key(private_key)?;

        let enc: [u8; X25519_PUBLIC_KEY_SIZE] = encapsulated_key.try_into().map_err(|_| {
            CryptoError::InvalidCiphertext(format!(
                "Invalid encapsulated key size: expected {}, got {}",
                X25519_PUBLIC_KEY_SIZE,
                encapsulated_key.len()
            ))
        })?;
        let ephemeral_public = PublicKey::from(enc);

        let dh = secret.diffie_hellman(&ephemeral_public);
        if !dh.was_contributory() {
            return Err(CryptoError::InvalidCiphertext(
                "Encapsulated key is a low-order point".to_string(),
            ));
        }

        let recipient = PublicKey::from(&secret);
        kdf::extract_shared_secret(dh.as_bytes(), &enc, recipient.as_bytes())
    }
}
