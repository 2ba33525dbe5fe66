//! Codex Importer
//!
//! Turns uploaded lore documents into structured codex entry drafts using an
//! LLM.
//!
//! # Overview
//!
//! A document is split into bounded chunks. Each chunk is sent to the
//! extraction service together with the filename, its position in the
//! document and every title confirmed by earlier chunks, so the service can
//! avoid extracting the same entity twice. The raw response is recovered
//! into a JSON array even when it was truncated, fenced, or wrapped in
//! prose, and every record is normalized into a [`CodexEntryDraft`].
//!
//! # Architecture
//!
//! ```text
//! Text → Chunker → { Prompt → LLM → Recovery → Normalizer } per chunk → Drafts
//! ```
//!
//! # Failure model
//!
//! - Missing credential or invalid settings: [`ImporterError::Config`], no chunk is sent
//! - Text below the minimum length: empty success, no call is made
//! - Transport error or timeout: the chunk reports an `error`, the job continues
//! - Unrecoverable response: the chunk reports a `warning`, the job continues
//! - Malformed record: dropped and counted
//!
//! # Example Usage
//!
//! ```no_run
//! use codex_importer::{ImportRequest, Importer, ImporterConfig};
//! use codex_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::new(r#"[{"title": "The Sunfather", "category": "deity"}]"#);
//! let importer = Importer::new(provider, ImporterConfig::default());
//!
//! let result = importer
//!     .import(ImportRequest::new("# The Sunfather\nLord of the first dawn.", "lore.md"))
//!     .await?;
//!
//! for entry in &result.entries {
//!     println!("{} ({})", entry.title, entry.category);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`CodexEntryDraft`]: codex_domain::CodexEntryDraft

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod importer;
mod normalizer;
mod prompt;
mod recovery;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::{Chunk, TextChunker};
pub use config::{CategoryPolicy, ChunkStrategy, ImporterConfig};
pub use error::ImporterError;
pub use importer::Importer;
pub use normalizer::{normalize, normalize_entry, Normalized, Rejection};
pub use prompt::PromptBuilder;
pub use recovery::{recover, Recovered, RecoveryError, RecoveryStep};
pub use types::{
    ChunkReport, ChunkRequest, ChunkResult, ChunkStats, ImportMetadata, ImportRequest,
    ImportResult,
};
