//! Error types for the Importer

use thiserror::Error;

/// Errors that can occur during an import
///
/// Only job-level failures surface as this type. Transport failures and
/// unrecoverable responses stay scoped to their chunk and are reported in
/// its [`ChunkResult`](crate::ChunkResult).
#[derive(Error, Debug)]
pub enum ImporterError {
    /// Missing access credential or invalid settings; no chunk is processed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Completion provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// A single extraction call exceeded its timeout
    #[error("Extraction timeout")]
    Timeout,
}
