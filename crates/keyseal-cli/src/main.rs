use clap::Parser;
use keyseal_cli::commands::{self, GenerateOptions};
use keyseal_cli::config::{Cli, Command};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for `info`
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Generate {
            keyset_path,
            format,
            key_count,
            key_id,
        } => {
            let options = GenerateOptions {
                format: format.into(),
                key_count,
                key_id,
            };
            let info = commands::generate(&keyset_path, &options)?;
            println!(
                "Generated keyset with {} key(s), primary {} at {}",
                info.keys.len(),
                info.primary_key_id,
                keyset_path.display()
            );
        }

        Command::Public {
            keyset_path,
            output_path,
            format,
        } => {
            commands::public(&keyset_path, &output_path, format.map(Into::into))?;
            println!("Wrote public keyset to {}", output_path.display());
        }

        Command::Encrypt {
            keyset_path,
            input_path,
            output_path,
            context_info,
        } => {
            commands::encrypt(&keyset_path, &input_path, &output_path, context_info.as_bytes())?;
        }

        Command::Decrypt {
            keyset_path,
            input_path,
            output_path,
            context_info,
        } => {
            commands::decrypt(&keyset_path, &input_path, &output_path, context_info.as_bytes())?;
        }

        Command::Info { keyset_path } => {
            let info = commands::info(&keyset_path)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
