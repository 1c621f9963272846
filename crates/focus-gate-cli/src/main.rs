//! focus-gate CLI: drive the focus scheduler from a terminal.

mod console;

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use clap::{Parser, Subcommand};
use focus_gate_daemon::config::LoggingConfig;
use focus_gate_daemon::setup;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "focus-gate",
    about = "Mute a voice group while it focuses, unmute it on breaks",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated voice group and read chat commands from stdin.
    Run {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<String>,

        /// Other participants in the voice group, comma separated.
        #[arg(short, long, value_delimiter = ',', default_value = "alice,bob")]
        participants: Vec<String>,
    },

    /// Print the default configuration.
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            participants,
        } => {
            let config = setup::load_config(config.as_deref())?;
            init_tracing(&config.logging)?;
            tracing::info!(participants = ?participants, "starting console session");
            console::run(config, &participants).await?;
        }
        Commands::DefaultConfig => {
            print!("{}", setup::default_config_toml()?);
        }
    }

    Ok(())
}

/// Console output plus an optional plain-text log file. `RUST_LOG` overrides
/// the configured level.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("initializing tracing")?;
    Ok(())
}

/// Each run starts a fresh log.
fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn log_file_is_truncated_on_open() {
        let path = std::env::temp_dir().join(format!("focus-gate-log-{}.log", std::process::id()));
        std::fs::write(&path, "previous run\n").unwrap();

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "this run").unwrap();
        drop(file);

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(content, "this run\n");
    }
}
