use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use keyseal_crypto::KeysetFormat;

/// Keyset file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Binary,
}

impl From<FormatArg> for KeysetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => KeysetFormat::Json,
            FormatArg::Binary => KeysetFormat::Binary,
        }
    }
}

#[derive(Parser)]
#[command(name = "keyseal", about = "Hybrid public-key encryption with rotating keysets")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a new private keyset
    Generate {
        /// Where to write the keyset; must not exist yet
        #[arg(long)]
        keyset_path: PathBuf,
        /// Keyset encoding
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,
        /// Number of enabled keys to generate
        #[arg(long, default_value_t = 1)]
        key_count: usize,
        /// Key id for the primary key (random if omitted)
        #[arg(long)]
        key_id: Option<u32>,
    },
    /// Write the public keyset for a private one
    Public {
        /// Private keyset to read
        #[arg(long)]
        keyset_path: PathBuf,
        /// Where to write the public keyset
        #[arg(long)]
        output_path: PathBuf,
        /// Output encoding (defaults to the input's)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Encrypt a file to the keyset's primary key
    Encrypt {
        /// Public or private keyset
        #[arg(long)]
        keyset_path: PathBuf,
        /// Plaintext file
        #[arg(long)]
        input_path: PathBuf,
        /// Ciphertext file
        #[arg(long)]
        output_path: PathBuf,
        /// Context info bound to the ciphertext
        #[arg(long, default_value = "")]
        context_info: String,
    },
    /// Decrypt a file with a private keyset
    Decrypt {
        /// Private keyset
        #[arg(long)]
        keyset_path: PathBuf,
        /// Ciphertext file
        #[arg(long)]
        input_path: PathBuf,
        /// Plaintext file
        #[arg(long)]
        output_path: PathBuf,
        /// Context info used at encryption
        #[arg(long, default_value = "")]
        context_info: String,
    },
    /// Print the keyset's key ids and statuses as JSON
    Info {
        /// Keyset to describe
        #[arg(long)]
        keyset_path: PathBuf,
    },
}
