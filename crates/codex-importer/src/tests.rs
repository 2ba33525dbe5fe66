//! Integration tests for the Importer

#[cfg(test)]
mod tests {
    use crate::{
        CategoryPolicy, ChunkRequest, ImportRequest, Importer, ImporterConfig, ImporterError,
        RecoveryStep,
    };
    use codex_domain::{
        Category, Completion, CompletionProvider, CompletionRequest, TemporalKind,
    };
    use codex_llm::{LlmError, MockProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const SUNFATHER: &str = r#"[{
        "title": "The Sunfather",
        "category": "deity",
        "summary": "God of the first dawn.",
        "fields": {"domains": ["sun", "fire"]},
        "body": "Creator of @the_alduinari.",
        "tags": ["pantheon"],
        "temporal": {"type": "immortal", "active_start": -5000}
    }]"#;

    const ALDUINARI: &str = r#"[{
        "title": "The Alduinari",
        "category": "race",
        "summary": "Children of the first light.",
        "fields": {"creators": "@the_sunfather", "lifespan": "800 years"},
        "tags": ["elder race"]
    }]"#;

    /// Two headed sections that split into exactly two chunks at 200 chars
    fn two_section_text() -> String {
        format!(
            "# The Sunfather\n{}\n\n# The Alduinari\n{}",
            "The god of dawn burns over the eastern sea. ".repeat(3),
            "They are children of light and song. ".repeat(4)
        )
    }

    fn chunked_config() -> ImporterConfig {
        ImporterConfig {
            max_chunk_size: 200,
            ..ImporterConfig::default()
        }
    }

    /// Provider that sleeps before answering
    struct SlowProvider {
        delay: Duration,
        reply: String,
        calls: Arc<AtomicUsize>,
    }

    impl CompletionProvider for SlowProvider {
        type Error = LlmError;

        fn complete(&self, _request: &CompletionRequest) -> Result<Completion, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(Completion::text(self.reply.clone()))
        }
    }

    /// Provider that records how many calls overlap
    #[derive(Default)]
    struct OverlapProvider {
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl CompletionProvider for OverlapProvider {
        type Error = LlmError;

        fn complete(&self, _request: &CompletionRequest) -> Result<Completion, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(1_300));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Completion::text("[]"))
        }
    }

    #[tokio::test]
    async fn test_full_import_flow() {
        let lore = format!(
            "## The Sunfather\n{}\n\n## The Alduinari\n{}",
            "In the beginning the Sunfather kindled the first dawn over the sea. ".repeat(15),
            "The Alduinari were shaped from that light and sing to it still. ".repeat(15)
        );
        assert!(lore.len() > 1_900);

        let provider = MockProvider::new(
            r###"```json
[
  {"title": "## The Sunfather {#the-sunfather}", "category": "Deity", "summary": "Kindler of the first dawn."},
  {"title": "**The Alduinari**", "category": "race", "summary": "A people shaped from light."}
]
```"###,
        );
        let importer = Importer::new(provider.clone(), ImporterConfig::default());

        let result = importer
            .import(ImportRequest::new(lore, "lore.txt"))
            .await
            .unwrap();

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].title, "The Sunfather");
        assert_eq!(result.entries[0].category, Category::Deity);
        assert_eq!(result.entries[1].title, "The Alduinari");
        assert_eq!(result.entries[1].category, Category::Race);
        for entry in &result.entries {
            assert!(!entry.summary.is_empty());
            assert!(entry.fields.is_empty());
            assert!(entry.tags.is_empty());
        }

        assert_eq!(result.metadata.total_chunks, 1);
        assert_eq!(result.metadata.filename, "lore.txt");
        assert_eq!(result.chunks[0].stats.recovery_step, Some(RecoveryStep::Unfenced));
        assert_eq!(provider.call_count(), 1);

        let request = &provider.requests()[0];
        assert!(request.user.contains("Document: lore.txt"));
        assert!(!request.user.contains("section 1 of"));
    }

    #[tokio::test]
    async fn test_short_text_makes_no_call() {
        let provider = MockProvider::new(SUNFATHER);
        let importer = Importer::new(provider.clone(), ImporterConfig::default());

        let result = importer
            .import(ImportRequest::new("Hi   ", "tiny.txt"))
            .await
            .unwrap();

        assert!(result.entries.is_empty());
        assert!(result.chunks.is_empty());
        assert_eq!(provider.call_count(), 0);

        let chunk = importer
            .import_chunk(ChunkRequest {
                text: "short".to_string(),
                filename: "tiny.txt".to_string(),
                chunk_index: 0,
                total_chunks: 1,
                existing_titles: Vec::new(),
            })
            .await
            .unwrap();
        assert!(chunk.entries.is_empty());
        assert!(chunk.error.is_none());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_fatal() {
        let provider = MockProvider::new(SUNFATHER).without_credential();
        let importer = Importer::new(provider.clone(), ImporterConfig::default());

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.txt"))
            .await;
        assert!(matches!(result, Err(ImporterError::Config(_))));

        let result = importer
            .import_chunk(ChunkRequest {
                text: two_section_text(),
                filename: "lore.txt".to_string(),
                chunk_index: 0,
                total_chunks: 1,
                existing_titles: Vec::new(),
            })
            .await;
        assert!(matches!(result, Err(ImporterError::Config(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_fatal() {
        let config = ImporterConfig {
            max_output_tokens: 0,
            ..ImporterConfig::default()
        };
        let importer = Importer::new(MockProvider::new("[]"), config);
        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.txt"))
            .await;
        assert!(matches!(result, Err(ImporterError::Config(_))));
    }

    #[tokio::test]
    async fn test_second_chunk_lists_first_chunk_titles() {
        let provider = MockProvider::new("[]");
        provider.push_response(SUNFATHER);
        provider.push_response(ALDUINARI);
        let importer = Importer::new(provider.clone(), chunked_config());

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert_eq!(result.metadata.total_chunks, 2);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].category, Category::Deity);
        assert_eq!(result.entries[1].category, Category::Race);
        assert_eq!(
            result.entries[0].temporal.as_ref().map(|t| t.kind),
            Some(TemporalKind::Immortal)
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].user.contains("section 1 of 2"));
        assert!(!requests[0].user.contains("Do NOT extract"));
        assert!(requests[1].user.contains("section 2 of 2"));
        assert!(requests[1].user.contains("- The Sunfather\n"));
        assert!(requests[1].user.contains("# The Alduinari"));
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_the_job() {
        let provider = MockProvider::new("[]");
        provider.push_error(LlmError::Status {
            status: 500,
            message: "Internal server error".to_string(),
        });
        provider.push_response(ALDUINARI);
        let importer = Importer::new(provider.clone(), chunked_config());

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].title, "The Alduinari");

        let first = &result.chunks[0];
        assert_eq!(first.entries, 0);
        assert!(first.error.as_deref().unwrap_or("").contains("500"));
        assert!(result.chunks[1].error.is_none());
        assert_eq!(result.metadata.chunks_failed, 1);
        assert_eq!(result.warnings().len(), 1);

        // Nothing was confirmed by the failed chunk
        assert!(!provider.requests()[1].user.contains("Do NOT extract"));
    }

    #[tokio::test]
    async fn test_chunk_request_error_is_chunk_scoped() {
        let provider = MockProvider::new("[]");
        provider.push_error(LlmError::Communication("connection refused".to_string()));
        let importer = Importer::new(provider, ImporterConfig::default());

        let result = importer
            .import_chunk(ChunkRequest {
                text: two_section_text(),
                filename: "lore.md".to_string(),
                chunk_index: 0,
                total_chunks: 2,
                existing_titles: Vec::new(),
            })
            .await
            .unwrap();

        assert!(result.entries.is_empty());
        assert!(result.is_error());
        let wire = serde_json::to_value(&result).unwrap();
        assert!(wire["error"].as_str().unwrap().contains("connection refused"));
        assert!(wire.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_existing_titles_are_sent_and_not_enforced() {
        let provider = MockProvider::new(SUNFATHER);
        let importer = Importer::new(provider.clone(), ImporterConfig::default());

        let result = importer
            .import_chunk(ChunkRequest {
                text: "The Sunfather returned in the Second Age.".to_string(),
                filename: "lore.md".to_string(),
                chunk_index: 1,
                total_chunks: 2,
                existing_titles: vec!["the_sunfather".to_string()],
            })
            .await
            .unwrap();

        let request = &provider.requests()[0];
        assert!(request.user.contains("Do NOT extract these again"));
        assert!(request.user.contains("- the_sunfather\n"));
        assert!(request.user.contains("section 2 of 2"));

        // Cooperative dedup: the service ignored the hint and the entry is kept
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.stats.duplicates_dropped, 0);
    }

    #[tokio::test]
    async fn test_local_dedupe_drops_known_titles() {
        let config = ImporterConfig {
            dedupe_titles: true,
            ..ImporterConfig::default()
        };
        let importer = Importer::new(MockProvider::new(SUNFATHER), config);

        let result = importer
            .import_chunk(ChunkRequest {
                text: "The Sunfather returned in the Second Age.".to_string(),
                filename: "lore.md".to_string(),
                chunk_index: 1,
                total_chunks: 2,
                existing_titles: vec!["the_sunfather".to_string()],
            })
            .await
            .unwrap();

        assert!(result.entries.is_empty());
        assert_eq!(result.stats.duplicates_dropped, 1);
    }

    #[tokio::test]
    async fn test_local_dedupe_across_chunks() {
        let provider = MockProvider::new("[]");
        provider.push_response(SUNFATHER);
        provider.push_response(SUNFATHER);
        let config = ImporterConfig {
            dedupe_titles: true,
            ..chunked_config()
        };
        let importer = Importer::new(provider, config);

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.chunks[1].stats.duplicates_dropped, 1);
    }

    #[tokio::test]
    async fn test_truncated_response_keeps_complete_entries() {
        let provider = MockProvider::new("[]");
        provider.push_truncated(
            r#"[{"title": "The Sunfather", "category": "deity"}, {"title": "The Alduinari", "category": "ra"#,
        );
        let importer = Importer::new(provider, ImporterConfig::default());

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert_eq!(result.entries.len(), 1);
        let stats = &result.chunks[0].stats;
        assert!(stats.truncated);
        assert_eq!(stats.recovery_step, Some(RecoveryStep::TruncatedArray));
        assert_eq!(result.metadata.chunks_failed, 0);
    }

    #[tokio::test]
    async fn test_unparseable_response_is_a_warning() {
        let importer = Importer::new(
            MockProvider::new("I'm sorry, I could not find any entities."),
            ImporterConfig::default(),
        );

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert!(result.entries.is_empty());
        assert!(result.chunks[0].warning.is_some());
        assert!(result.chunks[0].error.is_none());
        assert_eq!(result.metadata.chunks_failed, 1);
    }

    #[tokio::test]
    async fn test_malformed_records_are_dropped_and_counted() {
        let importer = Importer::new(
            MockProvider::new(
                r#"[{"title": "The Sunfather", "category": "deity"}, {"category": "race"}, {"title": "Nameless"}, 42]"#,
            ),
            ImporterConfig::default(),
        );

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.chunks[0].stats.rejected, 3);
        assert!(result.chunks[0].warning.is_none());
    }

    #[tokio::test]
    async fn test_strict_category_policy() {
        let response = r#"[
            {"title": "Skyship Meridian", "category": "vehicle"},
            {"title": "The Sunfather", "category": "god"}
        ]"#;

        let lenient = Importer::new(MockProvider::new(response), ImporterConfig::default());
        let result = lenient
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].category, Category::Other("vehicle".to_string()));

        let strict = Importer::new(
            MockProvider::new(response),
            ImporterConfig {
                category_policy: CategoryPolicy::Strict,
                ..ImporterConfig::default()
            },
        );
        let result = strict
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].category, Category::Deity);
        assert_eq!(result.chunks[0].stats.rejected, 1);
    }

    #[tokio::test]
    async fn test_extraction_timeout_is_chunk_scoped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = SlowProvider {
            delay: Duration::from_millis(1_500),
            reply: SUNFATHER.to_string(),
            calls: Arc::clone(&calls),
        };
        let config = ImporterConfig {
            extraction_timeout_secs: 1,
            ..ImporterConfig::default()
        };
        let importer = Importer::new(provider, config);

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert!(result.entries.is_empty());
        assert_eq!(
            result.chunks[0].error.as_deref(),
            Some(ImporterError::Timeout.to_string().as_str())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_job_deadline_skips_remaining_chunks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = SlowProvider {
            delay: Duration::from_millis(1_100),
            reply: SUNFATHER.to_string(),
            calls: Arc::clone(&calls),
        };
        let config = ImporterConfig {
            job_timeout_secs: Some(1),
            ..chunked_config()
        };
        let importer = Importer::new(provider, config);

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.chunks.len(), 2);
        assert!(result.chunks[1].stats.skipped);
        assert!(result.chunks[1].warning.as_deref().unwrap_or("").contains("deadline"));
        assert_eq!(result.metadata.chunks_failed, 1);
    }

    #[tokio::test]
    async fn test_timed_out_call_never_overlaps_next_chunk() {
        let provider = OverlapProvider::default();
        let peak = Arc::clone(&provider.peak);
        let calls = Arc::clone(&provider.calls);
        let config = ImporterConfig {
            extraction_timeout_secs: 1,
            ..chunked_config()
        };
        let importer = Importer::new(provider, config);

        let result = importer
            .import(ImportRequest::new(two_section_text(), "lore.md"))
            .await
            .unwrap();

        assert_eq!(result.chunks.len(), 2);
        assert!(result.chunks.iter().all(|chunk| chunk.error.is_some()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
