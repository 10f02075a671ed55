//! HKDF-SHA256 key derivation
//!
//! Two derivations feed the hybrid construction:
//!
//! - [`extract_shared_secret`]: turns the raw X25519 output into the KEM
//!   shared secret, binding it to the encapsulated key and the recipient key.
//! - [`derive_dem_key`]: turns a shared secret into the one-time AEAD key,
//!   binding it to the caller's context info.
//!
//! Both use an empty salt and put every binding input into HKDF's `info`
//! parameter after a fixed label, so derivation is fully deterministic.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// Size of KEM shared secrets and DEM keys (256 bits)
pub const SECRET_SIZE: usize = 32;

/// Label prefixed to the KEM derivation info
pub const KEM_LABEL: &[u8] = b"keyseal-kem-v1";

/// Label prefixed to the DEM key derivation info
pub const DEM_LABEL: &[u8] = b"keyseal-dem-v1";

/// KEM output; zeroized on drop
pub struct SharedSecret(Zeroizing<[u8; SECRET_SIZE]>);

impl SharedSecret {
    pub(crate) fn new(bytes: [u8; SECRET_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.0
    }
}

/// One-time symmetric key handed to the DEM; zeroized on drop
pub struct DemKey(Zeroizing<[u8; SECRET_SIZE]>);

impl DemKey {
    pub fn from_bytes(bytes: [u8; SECRET_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.0
    }
}

fn expand(ikm: &[u8], info: &[&[u8]]) -> CryptoResult<[u8; SECRET_SIZE]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; SECRET_SIZE];
    hk.expand_multi_info(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivationFailed(format!("HKDF expand failed: {}", e)))?;
    Ok(okm)
}

/// Derive the KEM shared secret from a Diffie-Hellman output
///
/// `info = KEM_LABEL || encapsulated_key || recipient_public_key`
pub fn extract_shared_secret(
    dh: &[u8],
    encapsulated_key: &[u8],
    recipient_public_key: &[u8],
) -> CryptoResult<SharedSecret> {
    let okm = expand(dh, &[KEM_LABEL, encapsulated_key, recipient_public_key])?;
    Ok(SharedSecret::new(okm))
}

/// Derive the DEM key for one hybrid ciphertext
///
/// `info = DEM_LABEL || context_info`
pub fn derive_dem_key(shared_secret: &SharedSecret, context_info: &[u8]) -> CryptoResult<DemKey> {
    let okm = expand(shared_secret.as_bytes(), &[DEM_LABEL, context_info])?;
    Ok(DemKey::from_bytes(okm))
}
