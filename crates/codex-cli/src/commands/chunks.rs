//! Chunks command implementation.

use crate::cli::ChunksArgs;
use crate::commands::read_document;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use codex_importer::{Chunk, TextChunker};

/// Execute the chunks command.
pub async fn execute_chunks(args: ChunksArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let text = read_document(&args.file)?;
    let chunks = preview_chunks(&args, config, &text)?;
    println!("{}", formatter.format_chunks(&chunks)?);
    Ok(())
}

/// Chunk a document with the effective importer settings.
pub fn preview_chunks(args: &ChunksArgs, config: &Config, text: &str) -> Result<Vec<Chunk>> {
    let importer_config = args.overrides.apply(&config.importer);
    importer_config.validate().map_err(CliError::Config)?;

    let chunker = TextChunker::new(importer_config.chunk_strategy, importer_config.max_chunk_size);
    Ok(chunker.chunk(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ImporterOverrides;
    use std::path::PathBuf;

    #[test]
    fn test_preview_uses_overrides() {
        let args = ChunksArgs {
            file: PathBuf::from("-"),
            overrides: ImporterOverrides {
                max_chunk_size: Some(20),
                ..ImporterOverrides::default()
            },
        };
        let text = "# One\nfirst part\n# Two\nsecond part here";
        let chunks = preview_chunks(&args, &Config::default(), text).unwrap();

        assert!(chunks.len() > 1);
        assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<String>(), text);
    }

    #[test]
    fn test_preview_rejects_invalid_settings() {
        let args = ChunksArgs {
            file: PathBuf::from("-"),
            overrides: ImporterOverrides {
                max_chunk_size: Some(0),
                ..ImporterOverrides::default()
            },
        };
        assert!(matches!(
            preview_chunks(&args, &Config::default(), "text"),
            Err(CliError::Config(_))
        ));
    }
}
