//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use codex_domain::CodexEntryDraft;
use codex_importer::{Chunk, ChunkReport, ImportResult};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest summary or preview shown in a table cell
const CELL_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format entry drafts.
    pub fn format_entries(&self, entries: &[CodexEntryDraft]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
            OutputFormat::Table => Ok(self.format_entries_table(entries)),
            OutputFormat::Quiet => Ok(entries
                .iter()
                .map(|entry| entry.title.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_entries_table(&self, entries: &[CodexEntryDraft]) -> String {
        if entries.is_empty() {
            return self.colorize("No entries found.", Tone::Warn);
        }

        let mut builder = Builder::default();
        builder.push_record(["Title", "Category", "Summary", "Fields", "Tags", "Refs"]);

        for entry in entries {
            builder.push_record([
                entry.title.clone(),
                entry.category.to_string(),
                truncate(&entry.summary, CELL_WIDTH),
                entry.fields.len().to_string(),
                entry.tags.join(", "),
                entry.cross_references().len().to_string(),
            ]);
        }

        rounded_table(builder)
    }

    /// Format the per-chunk summary of an import.
    pub fn format_import_summary(&self, result: &ImportResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "metadata": result.metadata,
                "chunks": result.chunks,
            }))?),
            OutputFormat::Quiet => Ok(result.entries.len().to_string()),
            OutputFormat::Table => {
                let mut out = String::new();
                if !result.chunks.is_empty() {
                    out.push_str(&self.format_chunk_reports(&result.chunks));
                    out.push('\n');
                }
                let message = format!(
                    "Imported {} entr{} from '{}' ({} chunk(s), {} failed, {} ms)",
                    result.entries.len(),
                    if result.entries.len() == 1 { "y" } else { "ies" },
                    result.metadata.filename,
                    result.metadata.total_chunks,
                    result.metadata.chunks_failed,
                    result.metadata.processing_time_ms
                );
                if result.metadata.chunks_failed > 0 {
                    out.push_str(&self.warning(&message));
                } else {
                    out.push_str(&self.success(&message));
                }
                Ok(out)
            }
        }
    }

    fn format_chunk_reports(&self, reports: &[ChunkReport]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Chunk", "Chars", "Entries", "Rejected", "Recovery", "Status"]);

        for report in reports {
            let stats = &report.stats;
            let status = match (&report.error, &report.warning) {
                (Some(error), _) => self.colorize(&truncate(error, CELL_WIDTH), Tone::Bad),
                (None, Some(warning)) => self.colorize(&truncate(warning, CELL_WIDTH), Tone::Warn),
                (None, None) if stats.truncated => self.colorize("ok (truncated)", Tone::Warn),
                (None, None) => self.colorize("ok", Tone::Good),
            };
            builder.push_record([
                format!("{}/{}", stats.index + 1, stats.total),
                stats.chars.to_string(),
                report.entries.to_string(),
                stats.rejected.to_string(),
                stats
                    .recovery_step
                    .map(|step| step.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                status,
            ]);
        }

        rounded_table(builder)
    }

    /// Format a chunking preview.
    pub fn format_chunks(&self, chunks: &[Chunk]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(chunks)?),
            OutputFormat::Quiet => Ok(chunks
                .iter()
                .map(|chunk| chunk.char_len().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Chunk", "Offset", "Chars", "Starts with"]);
                for chunk in chunks {
                    let first_line = chunk.text.trim_start().lines().next().unwrap_or("");
                    builder.push_record([
                        format!("{}/{}", chunk.index + 1, chunk.total),
                        chunk.offset.to_string(),
                        chunk.char_len().to_string(),
                        truncate(first_line, CELL_WIDTH),
                    ]);
                }
                Ok(rounded_table(builder))
            }
        }
    }

    /// `✓ message`, green when colour is on.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), Tone::Good)
    }

    /// `ℹ message`, blue when colour is on.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), Tone::Note)
    }

    /// `⚠ message`, yellow when colour is on.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), Tone::Warn)
    }

    fn colorize(&self, text: &str, tone: Tone) -> String {
        if !self.color_enabled {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Note => text.blue().to_string(),
            Tone::Warn => text.yellow().to_string(),
            Tone::Bad => text.red().to_string(),
        }
    }
}

/// Colour roles used in terminal output
#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Note,
    Warn,
    Bad,
}

/// Rounded table with a centred header row
fn rounded_table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Shorten text to at most `max` characters, marking the cut with `…`
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}
