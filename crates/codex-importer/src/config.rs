//! Configuration for the Importer

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Preferred chunk boundaries for large documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Headings first, then paragraphs, lines, sentences, whitespace
    #[default]
    BySection,
    /// Paragraphs first, then lines, sentences, whitespace
    ByParagraph,
    /// Any whitespace near the size bound
    ByCharacterCount,
}

/// What the normalizer does with a category outside the known set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Keep the entry with its label as-is
    #[default]
    Lenient,
    /// Reject the entry
    Strict,
}

/// Configuration for the Importer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Trimmed texts shorter than this (characters) import nothing
    pub min_text_length: usize,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum chunk size (characters)
    pub max_chunk_size: usize,

    /// Text chunking strategy for large documents
    pub chunk_strategy: ChunkStrategy,

    /// Output token bound for each extraction call
    pub max_output_tokens: u32,

    /// Maximum time for a single extraction call (seconds)
    pub extraction_timeout_secs: u64,

    /// Stop starting new chunks once the job has run this long (seconds)
    pub job_timeout_secs: Option<u64>,

    /// Handling of unrecognised categories
    pub category_policy: CategoryPolicy,

    /// Drop entries whose title key was already seen in this job
    pub dedupe_titles: bool,
}

impl ImporterConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Get the job deadline as a Duration, if one is set
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.max_chunk_size > self.max_text_length {
            return Err("max_chunk_size cannot exceed max_text_length".to_string());
        }
        if self.min_text_length > self.max_text_length {
            return Err("min_text_length cannot exceed max_text_length".to_string());
        }
        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ImporterConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            min_text_length: 10,
            max_text_length: 500_000,
            max_chunk_size: 12_000,
            chunk_strategy: ChunkStrategy::BySection,
            max_output_tokens: 8_192,
            extraction_timeout_secs: 180,
            job_timeout_secs: None,
            category_policy: CategoryPolicy::Lenient,
            dedupe_titles: false,
        }
    }
}

impl ImporterConfig {
    /// Aggressive preset: small chunks, short timeouts, strict categories
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 200_000,
            max_chunk_size: 6_000,
            max_output_tokens: 4_096,
            extraction_timeout_secs: 60,
            job_timeout_secs: Some(900),
            category_policy: CategoryPolicy::Strict,
            dedupe_titles: true,
            ..Self::default()
        }
    }

    /// Lenient preset: large chunks and long timeouts for better quality
    pub fn lenient() -> Self {
        Self {
            max_text_length: 2_000_000,
            max_chunk_size: 24_000,
            max_output_tokens: 16_000,
            extraction_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
