//! Error types for the codex-import binary.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Failures surfaced by CLI commands.
///
/// Chunk-level extraction failures are not errors here; they are reported
/// inside the import result and printed as warnings.
#[derive(Debug, Error)]
pub enum CliError {
    /// Unusable settings, or no home directory for the default path
    #[error("Configuration error: {0}")]
    Config(String),

    /// Job-level pipeline failure (credential, text length, settings)
    #[error(transparent)]
    Importer(#[from] codex_importer::ImporterError),

    /// Reading the document or writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A chunk request did not parse, or output could not be encoded
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configuration file is not valid TOML
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Refused user request, such as overwriting an existing config
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
