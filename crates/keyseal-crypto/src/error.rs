//! Error types for keyseal-crypto

use thiserror::Error;

use crate::key_material::KeyStatus;

/// Errors that can occur during keyset handling and hybrid encryption
///
/// The KEM and DEM layers report the fine-grained variants. Callers of
/// [`HybridDecryptor::decrypt`](crate::HybridDecryptor::decrypt) only ever see
/// [`CryptoError::MalformedCiphertext`] or [`CryptoError::DecryptionFailed`].
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("Authentication failed")]
    AuthenticationFailure,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("No usable key: {0}")]
    NoUsableKey(String),

    #[error("Unknown key id {0}")]
    UnknownKey(u32),

    #[error("Key {key_id} is not usable (status: {status})")]
    KeyDisabled { key_id: u32, status: KeyStatus },

    #[error("Malformed ciphertext: expected at least {expected} bytes, got {actual}")]
    MalformedCiphertext { expected: usize, actual: usize },

    #[error("Malformed keyset: {0}")]
    MalformedKeyset(String),

    #[error("Unsupported keyset schema version {0}")]
    UnsupportedVersion(u32),
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;
