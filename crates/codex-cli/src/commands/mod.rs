//! Command implementations.

pub mod chunks;
pub mod config;
pub mod import;
pub mod import_chunk;

pub use self::chunks::execute_chunks;
pub use self::config::execute_config;
pub use self::import::execute_import;
pub use self::import_chunk::execute_import_chunk;

use crate::config::Config;
use crate::error::Result;
use codex_importer::{Importer, ImporterConfig};
use codex_llm::AnthropicProvider;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::warn;

/// Build an importer backed by the HTTP provider
///
/// The API key is read here, from the variable named in the config, and
/// handed to the provider explicitly.
pub(crate) fn build_importer(
    config: &Config,
    importer_config: ImporterConfig,
    model: Option<&str>,
) -> Importer<AnthropicProvider> {
    let api_key = config.api_key();
    if api_key.trim().is_empty() {
        warn!(
            "Environment variable {} is not set",
            config.provider.api_key_env
        );
    }
    let provider = AnthropicProvider::new(config.anthropic_config(api_key, model));
    Importer::new(provider, importer_config)
}

/// Read a UTF-8 document from a file, or stdin when the path is `-`
pub(crate) fn read_document(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
