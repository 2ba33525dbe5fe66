//! Codex import CLI - turn lore documents into codex entry drafts.

use anyhow::Context;
use clap::Parser;
use codex_cli::commands;
use codex_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr so stdout stays clean JSON)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config, falling back to defaults when the file is absent
    let path = Config::resolve_path(cli.config.as_deref())?;
    let config = Config::load_from(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    match cli.command {
        Command::Import(args) => {
            commands::execute_import(args, &config, &formatter).await?;
        }
        Command::Chunks(args) => {
            commands::execute_chunks(args, &config, &formatter).await?;
        }
        Command::ImportChunk(args) => {
            commands::execute_import_chunk(args, &config).await?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, &path, &formatter).await?;
        }
    }

    Ok(())
}
