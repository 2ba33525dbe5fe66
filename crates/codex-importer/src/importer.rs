//! Core Importer implementation

use crate::chunking::TextChunker;
use crate::config::ImporterConfig;
use crate::error::ImporterError;
use crate::normalizer::normalize;
use crate::prompt::PromptBuilder;
use crate::recovery::recover;
use crate::types::{
    ChunkReport, ChunkRequest, ChunkResult, ChunkStats, ImportMetadata, ImportRequest,
    ImportResult,
};
use codex_domain::{title_key, Completion, CompletionProvider, CompletionRequest};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Importer turns lore documents into codex entry drafts
pub struct Importer<P>
where
    P: CompletionProvider,
{
    provider: Arc<P>,
    config: ImporterConfig,
}

/// Titles confirmed so far in one job, with their keys
#[derive(Default)]
struct KnownTitles {
    titles: Vec<String>,
    keys: HashSet<String>,
}

impl KnownTitles {
    fn seeded(titles: &[String]) -> Self {
        let mut known = Self::default();
        for title in titles {
            known.insert(title);
        }
        known
    }

    fn contains(&self, title: &str) -> bool {
        self.keys.contains(&title_key(title))
    }

    fn insert(&mut self, title: &str) {
        if self.keys.insert(title_key(title)) {
            self.titles.push(title.to_string());
        }
    }
}

impl<P> Importer<P>
where
    P: CompletionProvider + Send + Sync + 'static,
    P::Error: std::fmt::Display,
{
    /// Create a new Importer
    pub fn new(provider: P, config: ImporterConfig) -> Self {
        Self::with_shared_provider(Arc::new(provider), config)
    }

    /// Create an Importer around a provider that is shared elsewhere
    pub fn with_shared_provider(provider: Arc<P>, config: ImporterConfig) -> Self {
        Self { provider, config }
    }

    /// Importer configuration
    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// Name of the model serving extraction calls
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Import a whole document
    ///
    /// Chunks are processed in order; each extraction request lists every
    /// title confirmed by earlier chunks. A failing chunk contributes no
    /// entries and does not stop the job.
    pub async fn import(&self, request: ImportRequest) -> Result<ImportResult, ImporterError> {
        self.check_config()?;

        let start_time = Instant::now();
        let timestamp = unix_timestamp();

        let trimmed_len = request.text.trim().chars().count();
        if trimmed_len < self.config.min_text_length {
            info!(
                "Text of '{}' is below the minimum length ({} < {}), nothing to import",
                request.filename, trimmed_len, self.config.min_text_length
            );
            return Ok(ImportResult {
                entries: Vec::new(),
                chunks: Vec::new(),
                metadata: ImportMetadata {
                    filename: request.filename,
                    model_name: self.model_name().to_string(),
                    total_chunks: 0,
                    chunks_failed: 0,
                    processing_time_ms: 0,
                    timestamp,
                },
            });
        }

        let text_len = request.text.chars().count();
        if text_len > self.config.max_text_length {
            return Err(ImporterError::TextTooLong(
                text_len,
                self.config.max_text_length,
            ));
        }

        let chunker = TextChunker::new(self.config.chunk_strategy, self.config.max_chunk_size);
        let chunks = chunker.chunk(&request.text);

        info!(
            "Starting import of '{}': {} chars in {} chunk(s)",
            request.filename,
            text_len,
            chunks.len()
        );

        let deadline = self.config.job_timeout().map(|limit| start_time + limit);
        let gate = Arc::new(Semaphore::new(1));
        let mut known = KnownTitles::default();
        let mut entries = Vec::new();
        let mut reports = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let mut result = if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(
                    "Job deadline passed, skipping chunk {}/{}",
                    chunk.index + 1,
                    chunk.total
                );
                skipped_chunk(chunk.index, chunk.total, chunk.char_len(), &self.config)
            } else {
                debug!("Processing chunk {}/{}", chunk.index + 1, chunk.total);
                self.process_chunk(
                    &chunk.text,
                    &request.filename,
                    chunk.index,
                    chunk.total,
                    &known.titles,
                    &gate,
                )
                .await
            };

            self.admit_entries(&mut result, &mut known);
            reports.push(ChunkReport::from_result(&result));
            entries.extend(result.entries);
        }

        let chunks_failed = reports.iter().filter(|report| report.is_failure()).count();
        let processing_time_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Import of '{}' complete: {} entries, {} of {} chunk(s) failed, {} ms",
            request.filename,
            entries.len(),
            chunks_failed,
            chunks.len(),
            processing_time_ms
        );

        Ok(ImportResult {
            entries,
            chunks: reports,
            metadata: ImportMetadata {
                filename: request.filename,
                model_name: self.model_name().to_string(),
                total_chunks: chunks.len(),
                chunks_failed,
                processing_time_ms,
                timestamp,
            },
        })
    }

    /// Process one caller-driven chunk
    ///
    /// `existing_titles` from the request are passed to the extraction
    /// service as titles not to extract again.
    pub async fn import_chunk(&self, request: ChunkRequest) -> Result<ChunkResult, ImporterError> {
        self.check_config()?;

        let trimmed_len = request.text.trim().chars().count();
        if trimmed_len < self.config.min_text_length {
            debug!(
                "Chunk {} of '{}' is below the minimum length, skipping extraction",
                request.chunk_index + 1,
                request.filename
            );
            return Ok(ChunkResult::default());
        }

        let text_len = request.text.chars().count();
        if text_len > self.config.max_text_length {
            return Err(ImporterError::TextTooLong(
                text_len,
                self.config.max_text_length,
            ));
        }

        info!(
            "Processing chunk {}/{} of '{}' ({} known titles)",
            request.chunk_index + 1,
            request.total_chunks,
            request.filename,
            request.existing_titles.len()
        );

        let mut result = self
            .process_chunk(
                &request.text,
                &request.filename,
                request.chunk_index,
                request.total_chunks,
                &request.existing_titles,
                &Arc::new(Semaphore::new(1)),
            )
            .await;

        let mut known = KnownTitles::seeded(&request.existing_titles);
        self.admit_entries(&mut result, &mut known);
        Ok(result)
    }

    /// Extract, recover and normalize one chunk; failures stay in the result
    async fn process_chunk(
        &self,
        text: &str,
        filename: &str,
        chunk_index: usize,
        total_chunks: usize,
        known_titles: &[String],
        gate: &Arc<Semaphore>,
    ) -> ChunkResult {
        let start_time = Instant::now();
        let mut result = ChunkResult {
            stats: ChunkStats {
                index: chunk_index,
                total: total_chunks,
                chars: text.chars().count(),
                ..ChunkStats::default()
            },
            ..ChunkResult::default()
        };

        let request = PromptBuilder::new(text, filename)
            .with_position(chunk_index, total_chunks)
            .with_known_titles(known_titles.to_vec())
            .with_max_tokens(self.config.max_output_tokens)
            .build();

        debug!(
            "Prompt length: {} system + {} user chars",
            request.system.len(),
            request.user.len()
        );

        match self.call_provider(request, gate).await {
            Err(e) => {
                warn!("Chunk {}/{} failed: {}", chunk_index + 1, total_chunks, e);
                result.error = Some(e.to_string());
            }
            Ok(completion) => {
                let raw = completion.joined_text();
                let truncated = completion.is_truncated();
                result.stats.truncated = truncated;

                debug!(
                    "LLM response length: {} chars{}",
                    raw.len(),
                    if truncated { " (truncated)" } else { "" }
                );

                match recover(&raw, truncated) {
                    Err(e) => {
                        warn!(
                            "Chunk {}/{}: {} ({} chars)",
                            chunk_index + 1,
                            total_chunks,
                            e,
                            raw.len()
                        );
                        result.warning = Some(e.to_string());
                    }
                    Ok(recovered) => {
                        result.stats.recovery_step = Some(recovered.step);
                        let normalized = normalize(recovered.value, self.config.category_policy);

                        for rejection in &normalized.rejected {
                            warn!(
                                "Chunk {}/{}: dropped record: {}",
                                chunk_index + 1,
                                total_chunks,
                                rejection
                            );
                        }

                        info!(
                            "Chunk {}/{}: {} entries via {} recovery, {} rejected",
                            chunk_index + 1,
                            total_chunks,
                            normalized.entries.len(),
                            recovered.step,
                            normalized.rejected.len()
                        );

                        result.stats.rejected = normalized.rejected.len();
                        result.entries = normalized.entries;
                    }
                }
            }
        }

        result.stats.elapsed_ms = start_time.elapsed().as_millis() as u64;
        result
    }

    /// Record the chunk's titles as known, dropping repeats when local
    /// dedup is enabled
    fn admit_entries(&self, result: &mut ChunkResult, known: &mut KnownTitles) {
        if self.config.dedupe_titles {
            let before = result.entries.len();
            let mut kept = Vec::with_capacity(before);
            for entry in result.entries.drain(..) {
                if known.contains(&entry.title) {
                    debug!("Dropping duplicate entry '{}'", entry.title);
                    continue;
                }
                known.insert(&entry.title);
                kept.push(entry);
            }
            result.stats.duplicates_dropped = before - kept.len();
            result.entries = kept;
        } else {
            for entry in &result.entries {
                known.insert(&entry.title);
            }
        }
    }

    /// Configuration and credential check, before any chunk is processed
    fn check_config(&self) -> Result<(), ImporterError> {
        self.config.validate().map_err(ImporterError::Config)?;
        self.provider
            .ensure_configured()
            .map_err(|e| ImporterError::Config(e.to_string()))
    }

    /// Call the provider on the blocking pool, bounded by the extraction
    /// timeout
    ///
    /// The job's gate admits one provider call at a time. A call that timed
    /// out keeps its permit until the provider returns, so the next chunk's
    /// request never overlaps it.
    async fn call_provider(
        &self,
        request: CompletionRequest,
        gate: &Arc<Semaphore>,
    ) -> Result<Completion, ImporterError> {
        let permit = Arc::clone(gate)
            .acquire_owned()
            .await
            .map_err(|e| ImporterError::Llm(format!("Provider gate closed: {}", e)))?;
        let provider = Arc::clone(&self.provider);
        let abandoned = Arc::new(AtomicBool::new(false));
        let late = Arc::clone(&abandoned);

        // Call in a blocking context since CompletionProvider is not async
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let outcome = provider
                .complete(&request)
                .map_err(|e| ImporterError::Llm(e.to_string()));
            if late.load(Ordering::SeqCst) {
                warn!("Discarding late reply from a timed-out extraction call");
            }
            outcome
        });

        match timeout(self.config.extraction_timeout(), task).await {
            Ok(joined) => {
                joined.map_err(|e| ImporterError::Llm(format!("Task join error: {}", e)))?
            }
            Err(_) => {
                abandoned.store(true, Ordering::SeqCst);
                Err(ImporterError::Timeout)
            }
        }
    }
}

fn skipped_chunk(index: usize, total: usize, chars: usize, config: &ImporterConfig) -> ChunkResult {
    let limit = config.job_timeout_secs.unwrap_or_default();
    ChunkResult {
        warning: Some(format!("skipped: job deadline of {}s passed", limit)),
        stats: ChunkStats {
            index,
            total,
            chars,
            skipped: true,
            ..ChunkStats::default()
        },
        ..ChunkResult::default()
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
