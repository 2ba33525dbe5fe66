//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Codex import - turn lore documents into codex entry drafts.
#[derive(Debug, Parser)]
#[command(name = "codex-import")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CODEX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (titles only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a document and emit codex entry drafts
    Import(ImportArgs),

    /// Preview how a document would be chunked
    Chunks(ChunksArgs),

    /// Process one chunk request (JSON) and print the chunk result (JSON)
    ImportChunk(ImportChunkArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Importer settings that can be overridden per run.
#[derive(Debug, Clone, Default, Parser)]
pub struct ImporterOverrides {
    /// Start from a settings preset instead of the configured values
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Maximum chunk size in characters
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Chunk boundary strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// Document to import (UTF-8 text or markdown; `-` for stdin)
    pub file: PathBuf,

    /// Filename passed to the extraction service (defaults to the file name)
    #[arg(long)]
    pub filename: Option<String>,

    /// Write the entry drafts as a JSON array to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,

    /// Reject entries whose category is not recognised
    #[arg(long)]
    pub strict: bool,

    /// Drop entries whose title was already extracted in this job
    #[arg(long)]
    pub dedupe: bool,

    #[command(flatten)]
    pub overrides: ImporterOverrides,
}

/// Arguments for the chunks command.
#[derive(Debug, Parser)]
pub struct ChunksArgs {
    /// Document to chunk (`-` for stdin)
    pub file: PathBuf,

    #[command(flatten)]
    pub overrides: ImporterOverrides,
}

/// Arguments for the import-chunk command.
#[derive(Debug, Parser)]
pub struct ImportChunkArgs {
    /// JSON file holding `{text, filename, chunkIndex, totalChunks, existingTitles}`;
    /// reads stdin when omitted
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Importer presets.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// Balanced settings
    Default,
    /// Small chunks, short timeouts, strict categories
    Aggressive,
    /// Large chunks and long timeouts
    Lenient,
}

/// Chunk strategy argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StrategyArg {
    /// Headings, then paragraphs
    Section,
    /// Paragraphs
    Paragraph,
    /// Whitespace near the size bound
    Chars,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PresetArg> for codex_importer::ImporterConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => codex_importer::ImporterConfig::default(),
            PresetArg::Aggressive => codex_importer::ImporterConfig::aggressive(),
            PresetArg::Lenient => codex_importer::ImporterConfig::lenient(),
        }
    }
}

impl From<StrategyArg> for codex_importer::ChunkStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Section => codex_importer::ChunkStrategy::BySection,
            StrategyArg::Paragraph => codex_importer::ChunkStrategy::ByParagraph,
            StrategyArg::Chars => codex_importer::ChunkStrategy::ByCharacterCount,
        }
    }
}

impl ImporterOverrides {
    /// Apply the overrides on top of a base configuration
    pub fn apply(&self, base: &codex_importer::ImporterConfig) -> codex_importer::ImporterConfig {
        let mut config = match self.preset {
            Some(preset) => preset.into(),
            None => base.clone(),
        };
        if let Some(size) = self.max_chunk_size {
            config.max_chunk_size = size;
        }
        if let Some(strategy) = self.strategy {
            config.chunk_strategy = strategy.into();
        }
        config
    }
}
