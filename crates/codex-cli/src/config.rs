//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use codex_importer::ImporterConfig;
use codex_llm::anthropic::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use codex_llm::AnthropicConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Extraction service connection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Import pipeline settings
    #[serde(default)]
    pub importer: ImporterConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Extraction service connection.
///
/// The API key itself is never stored; `api_key_env` names the environment
/// variable it is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the messages API
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Per-request HTTP timeout (seconds)
    pub request_timeout_secs: u64,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".codex").join("config.toml"))
    }

    /// Resolve the path to use, preferring an explicit override.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::path(),
        }
    }

    /// Load configuration from file, or defaults when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.importer.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Read the API key from the configured environment variable.
    ///
    /// An unset variable yields an empty key; the importer reports it as a
    /// configuration error before any chunk is sent.
    pub fn api_key(&self) -> String {
        std::env::var(&self.provider.api_key_env).unwrap_or_default()
    }

    /// Build provider settings with an explicit key and optional model override.
    pub fn anthropic_config(&self, api_key: String, model: Option<&str>) -> AnthropicConfig {
        AnthropicConfig::new(api_key)
            .with_base_url(self.provider.base_url.clone())
            .with_model(model.unwrap_or(&self.provider.model))
            .with_timeout_secs(self.provider.request_timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
