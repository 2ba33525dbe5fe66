//! Import-chunk command implementation.

use crate::cli::ImportChunkArgs;
use crate::commands::{build_importer, read_document};
use crate::config::Config;
use crate::error::Result;
use codex_domain::CompletionProvider;
use codex_importer::{ChunkRequest, ChunkResult, Importer};
use std::path::PathBuf;
use tracing::warn;

/// Execute the import-chunk command.
///
/// Always prints the chunk result wire form, including for configuration
/// errors: `{"entries": [], "error": "..."}`.
pub async fn execute_import_chunk(args: ImportChunkArgs, config: &Config) -> Result<()> {
    let input_path = args.input.clone().unwrap_or_else(|| PathBuf::from("-"));
    let input = read_document(&input_path)?;

    let importer = build_importer(config, config.importer.clone(), args.model.as_deref());
    let result = run_import_chunk(&input, &importer).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Parse a chunk request and process it; importer errors become the
/// result's `error`.
pub async fn run_import_chunk<P>(input: &str, importer: &Importer<P>) -> Result<ChunkResult>
where
    P: CompletionProvider + Send + Sync + 'static,
    P::Error: std::fmt::Display,
{
    let request: ChunkRequest = serde_json::from_str(input)?;

    match importer.import_chunk(request).await {
        Ok(result) => Ok(result),
        Err(e) => {
            warn!("Chunk request failed: {}", e);
            Ok(ChunkResult::failed(e.to_string()))
        }
    }
}
