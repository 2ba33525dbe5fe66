//! Request and response types for imports

use crate::recovery::RecoveryStep;
use codex_domain::CodexEntryDraft;
use serde::{Deserialize, Serialize};

/// Request to import a whole document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Plain text of the document
    pub text: String,

    /// Name of the uploaded file, used as extraction context
    pub filename: String,
}

impl ImportRequest {
    /// Create a new import request
    pub fn new(text: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
        }
    }
}

/// Request to process one caller-driven chunk
///
/// The wire form uses camelCase keys (`chunkIndex`, `totalChunks`,
/// `existingTitles`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRequest {
    /// Chunk text
    pub text: String,

    /// Name of the source file
    pub filename: String,

    /// Zero-based position of the chunk
    #[serde(default)]
    pub chunk_index: usize,

    /// Number of chunks in the document
    #[serde(default = "default_total_chunks")]
    pub total_chunks: usize,

    /// Titles extracted from earlier chunks
    #[serde(default)]
    pub existing_titles: Vec<String>,
}

fn default_total_chunks() -> usize {
    1
}

/// Outcome of processing one chunk
///
/// The wire form is `{entries, warning?, error?}`; absent messages are
/// omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Entries extracted from the chunk
    pub entries: Vec<CodexEntryDraft>,

    /// Soft failure, such as an unrecoverable response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Hard failure, such as a transport error or timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Processing statistics, not part of the wire form
    #[serde(skip)]
    pub stats: ChunkStats,
}

impl ChunkResult {
    /// Result carrying only an error
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether the chunk failed outright
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Statistics for one processed (or skipped) chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStats {
    /// Zero-based position of the chunk
    pub index: usize,

    /// Number of chunks in the document
    pub total: usize,

    /// Chunk length in characters
    pub chars: usize,

    /// The service stopped at its output token limit
    pub truncated: bool,

    /// Ladder step that recovered the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_step: Option<RecoveryStep>,

    /// Records dropped by the normalizer
    pub rejected: usize,

    /// Entries dropped by local title dedup
    pub duplicates_dropped: usize,

    /// The chunk was never sent because the job deadline passed
    pub skipped: bool,

    /// Processing time in milliseconds
    pub elapsed_ms: u64,
}

/// Per-chunk summary within an import result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkReport {
    /// Statistics for the chunk
    #[serde(flatten)]
    pub stats: ChunkStats,

    /// Number of entries the chunk contributed
    pub entries: usize,

    /// Soft failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Hard failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChunkReport {
    /// Summarise a chunk result
    pub fn from_result(result: &ChunkResult) -> Self {
        Self {
            stats: result.stats.clone(),
            entries: result.entries.len(),
            warning: result.warning.clone(),
            error: result.error.clone(),
        }
    }

    /// Whether the chunk produced neither entries nor a clean outcome
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.warning.is_some()
    }
}

/// Result of importing a whole document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    /// Entries from every chunk, in document order
    pub entries: Vec<CodexEntryDraft>,

    /// One report per chunk; empty when the text was below the minimum
    pub chunks: Vec<ChunkReport>,

    /// Metadata about the import
    pub metadata: ImportMetadata,
}

impl ImportResult {
    /// Collected non-fatal messages, one per affected chunk
    pub fn warnings(&self) -> Vec<String> {
        self.chunks
            .iter()
            .filter_map(|chunk| {
                chunk
                    .error
                    .as_ref()
                    .or(chunk.warning.as_ref())
                    .map(|message| format!("chunk {}: {}", chunk.stats.index + 1, message))
            })
            .collect()
    }
}

/// Metadata about an import operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportMetadata {
    /// Source file name
    pub filename: String,

    /// Name of the LLM model used
    pub model_name: String,

    /// Number of chunks the document was split into
    pub total_chunks: usize,

    /// Chunks that ended in an error, a warning, or were skipped
    pub chunks_failed: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,

    /// Unix timestamp (seconds) when the import started
    pub timestamp: u64,
}
