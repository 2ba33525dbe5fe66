//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
pub async fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config, path, formatter),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Init { force } => {
            init_config(path, force)?;
            println!(
                "{}",
                formatter.success(&format!("Wrote default configuration to {}", path.display()))
            );
            Ok(())
        }
    }
}

/// Print the effective configuration.
fn show_config(config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Quiet | OutputFormat::Table => {
            if formatter.format() == OutputFormat::Table {
                let source = if path.exists() {
                    format!("Configuration from {}", path.display())
                } else {
                    format!("No file at {}, showing defaults", path.display())
                };
                println!("{}", formatter.info(&source));
                let key_state = if config.api_key().trim().is_empty() {
                    "not set"
                } else {
                    "set"
                };
                println!(
                    "{}",
                    formatter.info(&format!("API key ({}): {}", config.provider.api_key_env, key_state))
                );
                println!();
            }
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

/// Write a default configuration file.
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Config::default().save_to(path)
}
