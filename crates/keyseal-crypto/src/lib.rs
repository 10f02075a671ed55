//! # Keyseal Crypto
//!
//! Hybrid public-key encryption over a rotating keyset.
//!
//! A sender holding only public keys encrypts a message to the keyset's
//! primary key; the holder of the matching private keyset decrypts it. Each
//! ciphertext names the key it was produced under, so old ciphertexts stay
//! readable after the primary is rotated, for as long as their key remains
//! enabled.
//!
//! ## Construction
//!
//! - X25519 DHKEM with HKDF-SHA256 for key encapsulation
//! - HKDF-SHA256 to turn the shared secret and context info into a DEM key
//! - ChaCha20-Poly1305 with a random nonce for data encapsulation
//!
//! ## Key Types
//!
//! - [`Keyset`]: validated collection of [`KeyMaterial`] entries with a primary
//! - [`HybridEncryptor`]: encrypts to the primary key
//! - [`HybridDecryptor`]: decrypts under any enabled key in the keyset
//! - [`KeysetCodec`]: binary and JSON keyset encodings
//!
//! ## Example
//!
//! ```rust,ignore
//! use keyseal_crypto::{generate_keyset, HybridDecryptor, HybridEncryptor};
//!
//! let private_keyset = generate_keyset(1)?;
//! let public_keyset = private_keyset.public_keyset();
//!
//! let encryptor = HybridEncryptor::new(public_keyset)?;
//! let ciphertext = encryptor.encrypt(b"Hello, world!", b"context")?;
//!
//! let decryptor = HybridDecryptor::new(private_keyset)?;
//! let plaintext = decryptor.decrypt(&ciphertext, b"context")?;
//! assert_eq!(plaintext, b"Hello, world!");
//! ```

pub mod codec;
pub mod dem;
pub mod error;
pub mod hybrid;
pub mod kdf;
pub mod kem;
pub mod key_material;
pub mod keygen;
pub mod keyset;

// Re-exports
pub use codec::{KeysetCodec, KeysetFormat, KEYSET_SCHEMA_VERSION};
pub use dem::{ChaCha20Poly1305Dem, DemPrimitive};
pub use error::{CryptoError, CryptoResult};
pub use hybrid::{ciphertext_key_id, HybridDecryptor, HybridEncryptor, KEY_ID_SIZE};
pub use kdf::{DemKey, SharedSecret};
pub use kem::{KemPrimitive, X25519HkdfSha256Kem};
pub use key_material::{KeyMaterial, KeyPair, KeyStatus, PrivateKey};
pub use keygen::{generate_keyset, KeysetBuilder};
pub use keyset::{KeyInfo, Keyset, KeysetInfo};
