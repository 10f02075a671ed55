pub mod commands;
pub mod config;

pub use commands::{decrypt, encrypt, generate, info, load_keyset, public, GenerateOptions};
pub use config::{Cli, Command, FormatArg};
