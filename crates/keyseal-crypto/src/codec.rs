//! Keyset serialization
//!
//! Two stable encodings are supported.
//!
//! ## Binary
//!
//! ```text
//! varint(schema_version) || postcard(body)
//! body  = primary_key_id: varint u32, keys: varint len || key*
//! key   = key_id: varint u32, status: varint (0 ENABLED, 1 DISABLED, 2 DESTROYED),
//!         public_key: option<bytes>, private_key: option<bytes>
//! ```
//!
//! Options are a `0`/`1` tag byte; bytes are a varint length followed by the
//! raw bytes. Trailing input is rejected.
//!
//! ## JSON
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "primaryKeyId": 7,
//!   "keys": [
//!     { "keyId": 7, "status": "ENABLED", "publicKey": "<base64>", "privateKey": "<base64>" }
//!   ]
//! }
//! ```
//!
//! Key bytes use standard padded base64; absent keys are `null` or omitted.
//!
//! Keysets holding private keys are secrets in their own right. Loading one
//! from an untrusted or world-readable location is unsafe; wrapping keysets
//! under a key-encryption key is outside this crate.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::key_material::{KeyMaterial, KeyPair, KeyStatus, PrivateKey};
use crate::keyset::Keyset;

/// Schema version written by this crate and the only one it reads
pub const KEYSET_SCHEMA_VERSION: u32 = 1;

/// On-disk keyset encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeysetFormat {
    Binary,
    Json,
}

/// Reads and writes keysets in one [`KeysetFormat`]
#[derive(Debug, Clone, Copy)]
pub struct KeysetCodec {
    format: KeysetFormat,
}

impl KeysetCodec {
    pub fn new(format: KeysetFormat) -> Self {
        Self { format }
    }

    pub fn binary() -> Self {
        Self::new(KeysetFormat::Binary)
    }

    pub fn json() -> Self {
        Self::new(KeysetFormat::Json)
    }

    /// Guess the encoding of `source`: JSON when it starts with `{`
    pub fn detect(source: &[u8]) -> KeysetFormat {
        match source.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => KeysetFormat::Json,
            _ => KeysetFormat::Binary,
        }
    }

    /// Load a keyset in whichever format `source` is in
    pub fn load_any(source: &[u8]) -> CryptoResult<Keyset> {
        Self::new(Self::detect(source)).load(source)
    }

    /// Decode and validate a keyset
    ///
    /// # Errors
    ///
    /// - [`CryptoError::UnsupportedVersion`] for any schema version but
    ///   [`KEYSET_SCHEMA_VERSION`]
    /// - [`CryptoError::MalformedKeyset`] for anything structurally wrong
    pub fn load(&self, source: &[u8]) -> CryptoResult<Keyset> {
        let body = match self.format {
            KeysetFormat::Binary => decode_binary(source)?,
            KeysetFormat::Json => decode_json(source)?,
        };
        let keyset = body.into_keyset()?;
        tracing::debug!(
            format = ?self.format,
            entries = keyset.entries().len(),
            primary_key_id = keyset.primary_key_id(),
            private = keyset.has_private_keys(),
            "loaded keyset"
        );
        Ok(keyset)
    }

    /// Encode a keyset; [`load`](Self::load) restores it exactly
    pub fn serialize(&self, keyset: &Keyset) -> CryptoResult<Vec<u8>> {
        let body = KeysetBody::from_keyset(keyset);
        match self.format {
            KeysetFormat::Binary => {
                let mut out = postcard::to_allocvec(&KEYSET_SCHEMA_VERSION)
                    .map_err(|e| CryptoError::MalformedKeyset(e.to_string()))?;
                let encoded = Zeroizing::new(
                    postcard::to_allocvec(&body)
                        .map_err(|e| CryptoError::MalformedKeyset(e.to_string()))?,
                );
                out.extend_from_slice(&encoded);
                Ok(out)
            }
            KeysetFormat::Json => {
                let document = JsonKeyset {
                    schema_version: KEYSET_SCHEMA_VERSION,
                    body,
                };
                serde_json::to_vec_pretty(&document)
                    .map_err(|e| CryptoError::MalformedKeyset(e.to_string()))
            }
        }
    }
}

fn check_version(version: u32) -> CryptoResult<()> {
    if version != KEYSET_SCHEMA_VERSION {
        return Err(CryptoError::UnsupportedVersion(version));
    }
    Ok(())
}

fn decode_binary(source: &[u8]) -> CryptoResult<KeysetBody> {
    let (version, rest) = postcard::take_from_bytes::<u32>(source)
        .map_err(|e| CryptoError::MalformedKeyset(format!("missing schema version: {}", e)))?;
    check_version(version)?;

    let (body, remaining) = postcard::take_from_bytes::<KeysetBody>(rest)
        .map_err(|e| CryptoError::MalformedKeyset(e.to_string()))?;
    if !remaining.is_empty() {
        return Err(CryptoError::MalformedKeyset(format!(
            "{} trailing bytes after keyset",
            remaining.len()
        )));
    }
    Ok(body)
}

fn decode_json(source: &[u8]) -> CryptoResult<KeysetBody> {
    let value: serde_json::Value =
        serde_json::from_slice(source).map_err(|e| CryptoError::MalformedKeyset(e.to_string()))?;

    let version = value
        .get("schemaVersion")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| CryptoError::MalformedKeyset("missing schemaVersion".to_string()))?;
    let version = u32::try_from(version).map_err(|_| {
        CryptoError::MalformedKeyset(format!("schemaVersion {} out of range", version))
    })?;
    check_version(version)?;

    let document: JsonKeyset =
        serde_json::from_value(value).map_err(|e| CryptoError::MalformedKeyset(e.to_string()))?;
    Ok(document.body)
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonKeyset {
    schema_version: u32,
    #[serde(flatten)]
    body: KeysetBody,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeysetBody {
    primary_key_id: u32,
    keys: Vec<KeyRecord>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRecord {
    key_id: u32,
    status: KeyStatus,
    #[serde(default)]
    public_key: Option<KeyBytes>,
    #[serde(default)]
    private_key: Option<KeyBytes>,
}

impl KeysetBody {
    fn from_keyset(keyset: &Keyset) -> Self {
        let keys = keyset
            .entries()
            .iter()
            .map(|entry| KeyRecord {
                key_id: entry.key_id(),
                status: entry.status(),
                public_key: entry.public_key().map(|pk| KeyBytes(pk.to_vec())),
                private_key: entry.private_key().map(|sk| KeyBytes(sk.as_slice().to_vec())),
            })
            .collect();
        Self {
            primary_key_id: keyset.primary_key_id(),
            keys,
        }
    }

    fn into_keyset(self) -> CryptoResult<Keyset> {
        let mut entries = Vec::with_capacity(self.keys.len());
        for mut record in self.keys {
            let key_pair = match (record.public_key.as_mut(), record.private_key.as_mut()) {
                (Some(public), private) => Some(KeyPair::from_parts(
                    public.take(),
                    private.map(|sk| PrivateKey::new(sk.take())),
                )),
                (None, Some(_)) => {
                    return Err(CryptoError::MalformedKeyset(format!(
                        "key {} has a private key but no public key",
                        record.key_id
                    )));
                }
                (None, None) => None,
            };
            entries.push(KeyMaterial::from_parts(record.key_id, record.status, key_pair));
        }
        Keyset::new(self.primary_key_id, entries)
    }
}

/// Key bytes: base64 in human-readable formats, raw bytes otherwise
#[derive(Zeroize, ZeroizeOnDrop)]
struct KeyBytes(Vec<u8>);

impl KeyBytes {
    fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

impl Serialize for KeyBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            let encoded = Zeroizing::new(STANDARD.encode(&self.0));
            serializer.serialize_str(&encoded)
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for KeyBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let encoded = Zeroizing::new(String::deserialize(deserializer)?);
            STANDARD
                .decode(encoded.as_bytes())
                .map(KeyBytes)
                .map_err(|e| de::Error::custom(format!("invalid base64 key: {}", e)))
        } else {
            deserializer.deserialize_byte_buf(KeyBytesVisitor)
        }
    }
}

struct KeyBytesVisitor;

impl<'de> Visitor<'de> for KeyBytesVisitor {
    type Value = KeyBytes;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(KeyBytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Ok(KeyBytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(KeyBytes(bytes))
    }
}
