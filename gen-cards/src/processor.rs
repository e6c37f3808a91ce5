//! Pipeline orchestration: preprocess, chunk, prompt, extract, validate,
//! dedup, cache.
//!
//! One `process_content` call yields a single ordered sequence of
//! progress events ending in exactly one `Success` or `Error`. The
//! stream is lazy: nothing runs until the caller polls, and dropping it
//! stops all further chunk work.

use std::sync::Arc;

use async_stream::stream;
use futures_util::Stream;
use llm_client::{LlmProvider, LlmRequest};

use crate::cache::{ProcessingCache, content_hash};
use crate::cost::RateLimiter;
use crate::extract::cards_from_completion;
use crate::prompt::{SYSTEM_PROMPT, build_prompt};
use crate::store::KnowledgeCard;
use crate::text::{chunk_content, preprocess};
use crate::validate::{deduplicate_cards, quality_score, validate_cards};

/// One point in the progress sequence emitted per processing call.
#[derive(Debug, Clone)]
pub enum ProcessingResult {
    /// Advisory progress text
    Processing(String),
    /// A chunk completed but some of its cards were rejected
    PartialSuccess(String),
    /// Terminal: the finished card list
    Success {
        cards: Vec<KnowledgeCard>,
        from_cache: bool,
        quality_score: f64,
    },
    /// Terminal: the run failed
    Error(String),
}

/// Tunables for one processor instance.
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub max_chunk_size: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub requests_per_minute: usize,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: crate::text::DEFAULT_MAX_CHUNK_SIZE,
            temperature: 0.7,
            max_tokens: 2000,
            requests_per_minute: 60,
        }
    }
}

/// Drives a document through the extraction pipeline, one chunk at a
/// time, with an in-memory result cache keyed by content hash.
pub struct ContentProcessor {
    provider: Arc<dyn LlmProvider>,
    cache: ProcessingCache,
    limiter: RateLimiter,
    options: ProcessorOptions,
}

impl ContentProcessor {
    pub fn new(provider: Arc<dyn LlmProvider>, options: ProcessorOptions) -> Self {
        let limiter = RateLimiter::new(options.requests_per_minute);
        Self {
            provider,
            cache: ProcessingCache::new(),
            limiter,
            options,
        }
    }

    /// Process one document submission.
    ///
    /// Chunks are handled strictly in order with one provider call
    /// outstanding at a time. Any provider failure ends the sequence
    /// with `Error` and leaves no cache entry behind.
    pub fn process_content<'a>(
        &'a self,
        content: String,
        file_name: String,
        enable_validation: bool,
    ) -> impl Stream<Item = ProcessingResult> + 'a {
        stream! {
            yield ProcessingResult::Processing(format!("processing started for {}", file_name));

            let hash = content_hash(&content);
            if let Some(cards) = self.cache.get(&hash) {
                log::debug!("cache hit for {} ({} cards)", hash, cards.len());
                let score = quality_score(&cards);
                yield ProcessingResult::Success {
                    cards,
                    from_cache: true,
                    quality_score: score,
                };
                return;
            }

            yield ProcessingResult::Processing("preprocessing content".to_string());
            let processed = preprocess(&content, &file_name);

            yield ProcessingResult::Processing("analyzing content structure".to_string());
            let chunks = chunk_content(&processed, self.options.max_chunk_size);
            yield ProcessingResult::Processing(format!(
                "split content into {} chunks",
                chunks.len()
            ));

            let total = chunks.len();
            let mut all_cards = Vec::new();

            for (index, chunk) in chunks.iter().enumerate() {
                yield ProcessingResult::Processing(format!(
                    "processing chunk {}/{}",
                    index + 1,
                    total
                ));

                let chunk_cards = match self.process_single_chunk(chunk, &file_name, index).await {
                    Ok(cards) => cards,
                    Err(e) => {
                        log::debug!("chunk {} failed: {}", index + 1, e);
                        yield ProcessingResult::Error(format!("processing failed: {}", e));
                        return;
                    }
                };

                if enable_validation {
                    let result = validate_cards(chunk_cards);
                    if !result.invalid.is_empty() {
                        for rejected in &result.invalid {
                            log::debug!(
                                "chunk {}: rejected '{}' ({})",
                                index + 1,
                                rejected.card.keyword,
                                rejected.reasons.join(", ")
                            );
                        }
                        yield ProcessingResult::PartialSuccess(format!(
                            "chunk {}: {} cards need improvement",
                            index + 1,
                            result.invalid.len()
                        ));
                    }
                    all_cards.extend(result.valid);
                } else {
                    all_cards.extend(chunk_cards);
                }
            }

            let before_dedup = all_cards.len();
            let final_cards = deduplicate_cards(all_cards);
            if final_cards.len() < before_dedup {
                log::debug!(
                    "dropped {} duplicate cards",
                    before_dedup - final_cards.len()
                );
            }

            let score = quality_score(&final_cards);
            self.cache.insert(&hash, final_cards.clone());

            yield ProcessingResult::Success {
                cards: final_cards,
                from_cache: false,
                quality_score: score,
            };
        }
    }

    async fn process_single_chunk(
        &self,
        chunk: &str,
        file_name: &str,
        chunk_index: usize,
    ) -> llm_client::Result<Vec<KnowledgeCard>> {
        self.limiter.acquire().await;

        let prompt = build_prompt(chunk, file_name, chunk_index);
        let request = LlmRequest::new()
            .system(SYSTEM_PROMPT)
            .user(prompt)
            .temperature(self.options.temperature)
            .max_tokens(self.options.max_tokens);

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            log::debug!(
                "chunk {}: {} tokens in, {} out",
                chunk_index + 1,
                usage.input_tokens,
                usage.output_tokens
            );
        }

        Ok(cards_from_completion(&response.content, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, pin_mut};
    use llm_client::MockProvider;

    const GOOD_PAYLOAD: &str = r#"{
        "file_tag": "biology",
        "sections": [
            {
                "section_title": "Cells",
                "items": [
                    {"item_id": "1", "keyword": "mitochondria", "explanation": "Organelles that produce most of the cell's chemical energy supply."},
                    {"item_id": "2", "keyword": "ribosome", "explanation": "Molecular machines that synthesize proteins from messenger RNA."}
                ]
            }
        ]
    }"#;

    const REJECTED_PAYLOAD: &str = r#"{
        "sections": [
            {"items": [{"item_id": "1", "keyword": "entropy", "explanation": "x"}]}
        ]
    }"#;

    fn processor_with(provider: Arc<MockProvider>, max_chunk_size: usize) -> ContentProcessor {
        let options = ProcessorOptions {
            max_chunk_size,
            ..ProcessorOptions::default()
        };
        ContentProcessor::new(provider, options)
    }

    async fn collect_events(
        processor: &ContentProcessor,
        content: &str,
        validate: bool,
    ) -> Vec<ProcessingResult> {
        processor
            .process_content(content.to_string(), "notes.txt".to_string(), validate)
            .collect()
            .await
    }

    #[tokio::test]
    async fn happy_path_emits_ordered_events() {
        let mock = Arc::new(MockProvider::always_succeeds(GOOD_PAYLOAD));
        let processor = processor_with(mock.clone(), 2000);

        let events = collect_events(&processor, "the cell and its organelles", true).await;

        assert!(matches!(events.first(), Some(ProcessingResult::Processing(_))));
        match events.last() {
            Some(ProcessingResult::Success {
                cards,
                from_cache,
                quality_score,
            }) => {
                assert_eq!(cards.len(), 2);
                assert!(!from_cache);
                assert!(*quality_score > 0.0);
                assert_eq!(cards[0].keyword, "mitochondria");
            }
            other => panic!("expected terminal Success, got {:?}", other),
        }
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ProcessingResult::Error(_)))
        );
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn second_run_hits_cache() {
        let mock = Arc::new(MockProvider::always_succeeds(GOOD_PAYLOAD));
        let processor = processor_with(mock.clone(), 2000);

        let first = collect_events(&processor, "the cell and its organelles", true).await;
        let second = collect_events(&processor, "the cell and its organelles", true).await;

        let first_cards = match first.last() {
            Some(ProcessingResult::Success { cards, .. }) => cards.clone(),
            other => panic!("expected Success, got {:?}", other),
        };
        match second.last() {
            Some(ProcessingResult::Success {
                cards, from_cache, ..
            }) => {
                assert!(from_cache);
                assert_eq!(cards, &first_cards);
            }
            other => panic!("expected Success, got {:?}", other),
        }

        // Cache hit short-circuits: start event plus terminal Success
        assert_eq!(second.len(), 2);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn provider_error_is_terminal_and_uncached() {
        let mock = Arc::new(MockProvider::always_fails(llm_client::LlmError::ApiError {
            message: "bad request".to_string(),
            status_code: Some(400),
        }));
        let processor = processor_with(mock.clone(), 2000);

        let events = collect_events(&processor, "content", true).await;
        match events.last() {
            Some(ProcessingResult::Error(message)) => {
                assert!(message.contains("processing failed"));
            }
            other => panic!("expected terminal Error, got {:?}", other),
        }
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ProcessingResult::Success { .. }))
        );

        // No cache entry was written, the retry reaches the provider again
        let retry = collect_events(&processor, "content", true).await;
        assert!(matches!(retry.last(), Some(ProcessingResult::Error(_))));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn all_rejected_chunks_still_succeed() {
        let mock = Arc::new(MockProvider::always_succeeds(REJECTED_PAYLOAD));
        let processor = processor_with(mock.clone(), 2000);

        let events = collect_events(&processor, "content", true).await;

        assert!(
            events
                .iter()
                .any(|e| matches!(e, ProcessingResult::PartialSuccess(_)))
        );
        match events.last() {
            Some(ProcessingResult::Success {
                cards,
                from_cache,
                quality_score,
            }) => {
                assert!(cards.is_empty());
                assert!(!from_cache);
                assert_eq!(*quality_score, 0.0);
            }
            other => panic!("expected terminal Success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn validation_disabled_keeps_everything() {
        let mock = Arc::new(MockProvider::always_succeeds(REJECTED_PAYLOAD));
        let processor = processor_with(mock.clone(), 2000);

        let events = collect_events(&processor, "content", false).await;

        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ProcessingResult::PartialSuccess(_)))
        );
        match events.last() {
            Some(ProcessingResult::Success { cards, .. }) => {
                assert_eq!(cards.len(), 1);
                assert_eq!(cards[0].keyword, "entropy");
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn chunks_are_processed_in_order() {
        let payload_for = |keyword: &str| {
            format!(
                r#"{{"sections": [{{"items": [{{"keyword": "{}", "explanation": "A long enough explanation for the {} card."}}]}}]}}"#,
                keyword, keyword
            )
        };
        let first = payload_for("alpha");
        let second = payload_for("beta");
        let third = payload_for("gamma");
        let mock = Arc::new(MockProvider::with_responses(vec![
            first.as_str(),
            second.as_str(),
            third.as_str(),
        ]));
        // 119 chars of preprocessed content against a 40-char budget
        let processor = processor_with(mock.clone(), 40);

        let events = collect_events(&processor, &"z".repeat(100), true).await;

        assert!(events.iter().any(|e| {
            matches!(e, ProcessingResult::Processing(m) if m.contains("chunk 2/3"))
        }));
        match events.last() {
            Some(ProcessingResult::Success { cards, .. }) => {
                let keywords: Vec<&str> = cards.iter().map(|c| c.keyword.as_str()).collect();
                assert_eq!(keywords, vec!["alpha", "beta", "gamma"]);
            }
            other => panic!("expected Success, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn duplicates_across_chunks_are_dropped() {
        let mock = Arc::new(MockProvider::always_succeeds(GOOD_PAYLOAD));
        let processor = processor_with(mock.clone(), 40);

        let events = collect_events(&processor, &"z".repeat(100), true).await;

        match events.last() {
            Some(ProcessingResult::Success { cards, .. }) => {
                // Three chunks of identical payloads collapse to one pair
                assert_eq!(cards.len(), 2);
            }
            other => panic!("expected Success, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn dropping_stream_stops_work() {
        let mock = Arc::new(MockProvider::always_succeeds(GOOD_PAYLOAD));
        let processor = processor_with(mock.clone(), 2000);

        {
            let stream =
                processor.process_content("content".to_string(), "notes.txt".to_string(), true);
            pin_mut!(stream);
            // Poll the start event only, then drop the stream
            let first = stream.next().await;
            assert!(matches!(first, Some(ProcessingResult::Processing(_))));
        }

        assert_eq!(mock.call_count(), 0);
    }
}
