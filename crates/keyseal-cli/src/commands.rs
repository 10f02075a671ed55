//! File-level operations behind each subcommand

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use keyseal_crypto::{
    HybridDecryptor, HybridEncryptor, KeyStatus, Keyset, KeysetBuilder, KeysetCodec,
    KeysetFormat, KeysetInfo,
};

/// Options for [`generate`]
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub format: KeysetFormat,
    pub key_count: usize,
    pub key_id: Option<u32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            format: KeysetFormat::Json,
            key_count: 1,
            key_id: None,
        }
    }
}

/// Read a keyset in either format, warning when it carries private keys
pub fn load_keyset(path: &Path) -> anyhow::Result<Keyset> {
    let bytes = read_keyset_file(path)?;
    decode_keyset(path, &bytes)
}

fn read_keyset_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading keyset {}", path.display()))
}

fn decode_keyset(path: &Path, bytes: &[u8]) -> anyhow::Result<Keyset> {
    let keyset = KeysetCodec::load_any(bytes)
        .with_context(|| format!("loading keyset {}", path.display()))?;
    if keyset.has_private_keys() {
        tracing::warn!(
            path = %path.display(),
            "loaded cleartext private keys from disk; this is not recommended"
        );
    }
    Ok(keyset)
}

/// Generate a private keyset at `keyset_path`; the first key is primary
pub fn generate(keyset_path: &Path, options: &GenerateOptions) -> anyhow::Result<KeysetInfo> {
    if options.key_count == 0 {
        bail!("--key-count must be at least 1");
    }
    if options.key_id == Some(0) {
        bail!("--key-id must be non-zero");
    }

    let mut builder = match options.key_id {
        Some(key_id) => KeysetBuilder::new().add_key(key_id, KeyStatus::Enabled),
        None => KeysetBuilder::new().add_random_key(KeyStatus::Enabled),
    };
    for _ in 1..options.key_count {
        builder = builder.add_random_key(KeyStatus::Enabled);
    }
    let keyset = builder.build()?;

    let encoded = KeysetCodec::new(options.format).serialize(&keyset)?;
    write_new_secret(keyset_path, &encoded)
        .with_context(|| format!("writing keyset {}", keyset_path.display()))?;

    tracing::info!(
        path = %keyset_path.display(),
        keys = keyset.entries().len(),
        primary_key_id = keyset.primary_key_id(),
        "generated keyset"
    );
    Ok(keyset.info())
}

/// Write the public half of the keyset at `keyset_path` to `output_path`
///
/// The output uses `format`, or the input's format when `None`.
pub fn public(
    keyset_path: &Path,
    output_path: &Path,
    format: Option<KeysetFormat>,
) -> anyhow::Result<KeysetInfo> {
    let bytes = read_keyset_file(keyset_path)?;
    let format = format.unwrap_or_else(|| KeysetCodec::detect(&bytes));
    let keyset = decode_keyset(keyset_path, &bytes)?;

    let public = keyset.public_keyset();
    let encoded = KeysetCodec::new(format).serialize(&public)?;
    fs::write(output_path, encoded)
        .with_context(|| format!("writing public keyset {}", output_path.display()))?;
    Ok(public.info())
}

/// Encrypt `input_path` into `output_path`; returns the ciphertext size
pub fn encrypt(
    keyset_path: &Path,
    input_path: &Path,
    output_path: &Path,
    context_info: &[u8],
) -> anyhow::Result<usize> {
    let keyset = load_keyset(keyset_path)?;
    let encryptor = HybridEncryptor::new(keyset)
        .with_context(|| format!("keyset {} cannot encrypt", keyset_path.display()))?;

    let plaintext =
        fs::read(input_path).with_context(|| format!("reading {}", input_path.display()))?;
    let ciphertext = encryptor.encrypt(&plaintext, context_info)?;
    fs::write(output_path, &ciphertext)
        .with_context(|| format!("writing {}", output_path.display()))?;

    tracing::info!(
        key_id = encryptor.primary_key_id(),
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "encrypted"
    );
    Ok(ciphertext.len())
}

/// Decrypt `input_path` into `output_path`; returns the plaintext size
pub fn decrypt(
    keyset_path: &Path,
    input_path: &Path,
    output_path: &Path,
    context_info: &[u8],
) -> anyhow::Result<usize> {
    let keyset = load_keyset(keyset_path)?;
    let decryptor = HybridDecryptor::new(keyset)
        .with_context(|| format!("keyset {} cannot decrypt", keyset_path.display()))?;

    let ciphertext =
        fs::read(input_path).with_context(|| format!("reading {}", input_path.display()))?;
    let plaintext = decryptor
        .decrypt(&ciphertext, context_info)
        .with_context(|| format!("decrypting {}", input_path.display()))?;
    fs::write(output_path, &plaintext)
        .with_context(|| format!("writing {}", output_path.display()))?;

    tracing::info!(plaintext_len = plaintext.len(), "decrypted");
    Ok(plaintext.len())
}

/// Describe the keyset at `keyset_path`
pub fn info(keyset_path: &Path) -> anyhow::Result<KeysetInfo> {
    Ok(load_keyset(keyset_path)?.info())
}

/// Create `path` (failing if it exists) readable by the owner only
fn write_new_secret(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
