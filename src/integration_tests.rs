//! End-to-end tests for the translation pipeline
//!
//! Every test runs a full extract → plan → dispatch → reconcile → write cycle
//! against [`MockOracle`], so no network access is needed. The single test
//! against a real provider is ignored by default:
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! cargo test --lib integration_tests -- --ignored --nocapture
//! ```

#[cfg(test)]
mod tests {
    use crate::block::Address;
    use crate::config::{FailurePolicy, PipelineConfig};
    use crate::document::{Section, Slide, SlideDeck, Table, TextSource, WordDocument};
    use crate::error::LebabError;
    use crate::extract::extract_blocks;
    use crate::oracle::{ChunkRequest, MockMode, MockOracle, OpenAiOracle, TranslationOracle};
    use crate::pipeline::{Outcome, Pipeline};
    use crate::reconcile::{AnomalyKind, Severity};
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> PipelineConfig {
        PipelineConfig::new("en", "es").with_retries(0, Duration::ZERO)
    }

    fn pipeline(mock: &MockOracle, config: PipelineConfig) -> Pipeline {
        Pipeline::new(Arc::new(mock.clone()), config).unwrap()
    }

    fn sample_document() -> WordDocument {
        WordDocument::new()
            .with_paragraph("Quarterly report")
            .with_paragraph("")
            .with_paragraph("  Revenue grew in every region.  ")
            .with_table(Table::from_rows(&[&["Region", "Growth"], &["North", " "]]))
            .with_section(Section {
                header: vec!["Confidential".to_string()],
                footer: vec!["Page 1".to_string(), "\t".to_string()],
            })
    }

    // ============================================================================
    // Whole-document runs
    // ============================================================================

    #[tokio::test]
    async fn test_translates_every_region_in_place() {
        let mock = MockOracle::new(MockMode::Suffix);
        let mut doc = sample_document();

        let report = pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Translated);
        assert_eq!(report.blocks, 7);
        assert_eq!(report.translated, 7);
        assert!(report.anomalies.is_empty());
        assert!(report.write_failures.is_empty());

        assert_eq!(
            doc.paragraphs,
            vec![
                "Quarterly report_es",
                "",
                "  Revenue grew in every region._es  "
            ]
        );
        assert_eq!(doc.tables[0].rows[0][1].paragraphs[0], "Growth_es");
        assert_eq!(doc.tables[0].rows[1][0].paragraphs[0], "North_es");
        assert_eq!(doc.tables[0].rows[1][1].paragraphs[0], " ");
        assert_eq!(doc.sections[0].header[0], "Confidential_es");
        assert_eq!(doc.sections[0].footer, vec!["Page 1_es", "\t"]);
    }

    #[tokio::test]
    async fn test_slide_deck_run() {
        let mock = MockOracle::new(MockMode::Positional);
        let mut deck = SlideDeck::new()
            .with_slide(Slide::new().with_shape(&["Welcome", ""]).with_note("Smile"))
            .with_slide(Slide::new().with_shape(&["Questions?"]));

        let report = pipeline(&mock, config().with_max_chunk_size(12))
            .translate_document(&mut deck)
            .await
            .unwrap();

        assert_eq!(report.blocks, 3);
        assert_eq!(report.chunks, 2);
        assert_eq!(deck.slides[0].shapes[0].paragraphs, vec!["Welcome_es", ""]);
        assert_eq!(deck.slides[0].notes, vec!["Smile_es"]);
        assert_eq!(deck.slides[1].shapes[0].paragraphs, vec!["Questions?_es"]);
    }

    #[tokio::test]
    async fn test_writer_order_matches_extraction_order() {
        let mock = MockOracle::new(MockMode::Suffix);
        let doc = sample_document();
        let extracted: Vec<Address> = extract_blocks(&doc)
            .unwrap()
            .into_iter()
            .map(|b| b.address)
            .collect();

        let blocks = extract_blocks(&doc).unwrap();
        let result = pipeline(&mock, config().with_max_chunk_size(20))
            .translate_blocks(blocks)
            .await
            .unwrap();
        let written: Vec<Address> = result.blocks.into_iter().map(|b| b.address).collect();

        assert_eq!(written, extracted);
    }

    // ============================================================================
    // Empty input
    // ============================================================================

    #[tokio::test]
    async fn test_empty_document_is_a_no_op() {
        let mock = MockOracle::new(MockMode::Suffix);
        let mut doc = WordDocument::new()
            .with_paragraph("   ")
            .with_paragraph("")
            .with_table(Table::from_rows(&[&["\n"]]));
        let before = doc.clone();

        let report = pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::NothingToTranslate);
        assert_eq!(report.chunks, 0);
        assert_eq!(mock.calls(), 0);
        assert_eq!(doc, before);
    }

    // ============================================================================
    // Degraded oracle output
    // ============================================================================

    #[tokio::test]
    async fn test_cardinality_mismatch_tolerated() {
        let mock = MockOracle::new(MockMode::Truncate(3));
        let mut doc = WordDocument::new()
            .with_paragraph("a")
            .with_paragraph("b")
            .with_paragraph("c")
            .with_paragraph("d")
            .with_paragraph("e");

        let report = pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(doc.paragraphs, vec!["a_es", "b_es", "c_es", "d", "e"]);
        assert_eq!(report.translated, 3);
        assert_eq!(report.untranslated(), 2);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(
            report.anomalies[0].kind,
            AnomalyKind::CountMismatch {
                expected: 5,
                received: 3
            }
        );
        assert_eq!(report.anomalies[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_malformed_response_degrades_chunk_and_run_continues() {
        // First chunk answers garbage, the rest are fine
        struct GarbageFirst(MockOracle);

        #[async_trait::async_trait]
        impl TranslationOracle for GarbageFirst {
            async fn translate(
                &self,
                request: &ChunkRequest,
                source_locale: &str,
                target_locale: &str,
            ) -> crate::error::OracleResult<String> {
                if request.items[0].address.as_str() == "p[0]" {
                    return Ok("<html>502 Bad Gateway</html>".to_string());
                }
                self.0.translate(request, source_locale, target_locale).await
            }

            fn provider_name(&self) -> &str {
                "Garbage first"
            }
        }

        let mut doc = WordDocument::new()
            .with_paragraph("aaaa")
            .with_paragraph("bbbb")
            .with_paragraph("cccc")
            .with_paragraph("dddd")
            .with_paragraph("eeee");
        let pipeline = Pipeline::new(
            Arc::new(GarbageFirst(MockOracle::new(MockMode::Suffix))),
            config().with_max_chunk_size(16),
        )
        .unwrap();

        let report = pipeline.translate_document(&mut doc).await.unwrap();

        assert_eq!(report.chunks, 2);
        assert_eq!(doc.paragraphs, vec!["aaaa", "bbbb", "cccc", "dddd", "eeee_es"]);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].chunk, 0);
        assert_eq!(report.anomalies[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_reordered_response_assigned_by_address() {
        let mock = MockOracle::new(MockMode::Reverse);
        let mut doc = WordDocument::new()
            .with_paragraph("first")
            .with_paragraph("second")
            .with_paragraph("third");

        let report = pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(doc.paragraphs, vec!["first_es", "second_es", "third_es"]);
        assert!(report.anomalies.is_empty());
    }

    #[tokio::test]
    async fn test_extra_items_discarded_end_to_end() {
        let mock = MockOracle::new(MockMode::Extra(3));
        let mut doc = WordDocument::new().with_paragraph("one").with_paragraph("two");

        let report = pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(doc.paragraphs, vec!["one_es", "two_es"]);
        assert_eq!(report.anomalies.len(), 1);
    }

    #[tokio::test]
    async fn test_fenced_response_end_to_end() {
        let mock = MockOracle::new(MockMode::Fenced);
        let mut doc = WordDocument::new().with_paragraph("one");

        pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(doc.paragraphs, vec!["one_es"]);
    }

    #[tokio::test]
    async fn test_oversized_block_sent_whole() {
        let mock = MockOracle::new(MockMode::Suffix);
        let long = "x".repeat(500);
        let mut doc = WordDocument::new().with_paragraph(&long);

        let report = pipeline(&mock, config().with_max_chunk_size(100))
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(report.chunks, 1);
        assert_eq!(mock.calls(), 1);
        assert_eq!(doc.paragraphs[0], format!("{}_es", long));
    }

    // ============================================================================
    // Transport failures
    // ============================================================================

    #[tokio::test]
    async fn test_abort_leaves_document_untouched() {
        let mock = MockOracle::new(MockMode::Error("quota exceeded".to_string()));
        let mut doc = sample_document();
        let before = doc.clone();

        let result = pipeline(&mock, config().with_failure_policy(FailurePolicy::Abort))
            .translate_document(&mut doc)
            .await;

        assert!(matches!(result, Err(LebabError::Oracle { chunk: 0, .. })));
        assert_eq!(doc, before);
    }

    #[tokio::test]
    async fn test_abort_stops_dispatching_later_chunks() {
        let mock = MockOracle::new(MockMode::Error("quota exceeded".to_string()));
        let mut doc = WordDocument::new()
            .with_paragraph("aaaa")
            .with_paragraph("bbbb")
            .with_paragraph("cccc");

        let result = pipeline(
            &mock,
            config()
                .with_max_chunk_size(4)
                .with_failure_policy(FailurePolicy::Abort),
        )
        .translate_document(&mut doc)
        .await;

        assert!(matches!(result, Err(LebabError::Oracle { chunk: 0, .. })));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_policy_keeps_source_text() {
        let mock = MockOracle::new(MockMode::Error("timeout".to_string()));
        let mut doc = sample_document();
        let before = doc.clone();

        let report = pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(report.translated, 0);
        assert_eq!(report.anomalies.len(), report.chunks);
        assert_eq!(doc, before);
    }

    // ============================================================================
    // Concurrency
    // ============================================================================

    #[tokio::test]
    async fn test_concurrent_dispatch_preserves_order() {
        let texts: Vec<String> = (0..12).map(|i| format!("paragraph {:02}", i)).collect();
        let mut sequential_doc = WordDocument::new();
        for text in &texts {
            sequential_doc = sequential_doc.with_paragraph(text);
        }
        let mut concurrent_doc = sequential_doc.clone();

        let sequential = MockOracle::new(MockMode::Suffix);
        pipeline(&sequential, config().with_max_chunk_size(25))
            .translate_document(&mut sequential_doc)
            .await
            .unwrap();

        // Early chunks sleep longest, so they complete last
        let concurrent = MockOracle::staggered(MockMode::Suffix, 120);
        let report = pipeline(
            &concurrent,
            config().with_max_chunk_size(25).with_concurrency(4),
        )
        .translate_document(&mut concurrent_doc)
        .await
        .unwrap();

        assert_eq!(report.chunks, 6);
        assert_eq!(concurrent.calls(), 6);
        assert_eq!(concurrent_doc, sequential_doc);
        assert_eq!(concurrent_doc.paragraphs[0], "paragraph 00_es");
        assert_eq!(concurrent_doc.paragraphs[11], "paragraph 11_es");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_overlaps_latency() {
        let mock = MockOracle::with_delay(MockMode::Suffix, 100);
        let mut doc = WordDocument::new();
        for i in 0..4 {
            doc = doc.with_paragraph(&format!("block {}", i));
        }

        let start = tokio::time::Instant::now();
        pipeline(&mock, config().with_max_chunk_size(7).with_concurrency(4))
            .translate_document(&mut doc)
            .await
            .unwrap();

        // Four 100ms calls in flight together take one delay, not four
        assert_eq!(mock.calls(), 4);
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_run_writes_nothing() {
        let mock = MockOracle::with_delay(MockMode::Suffix, 50);
        let mut doc = WordDocument::new();
        for i in 0..5 {
            doc = doc.with_paragraph(&format!("block {}", i));
        }
        let before = doc.clone();

        let pipeline = pipeline(&mock, config().with_max_chunk_size(7));
        let cancel = pipeline.cancel_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(75)).await;
            cancel.cancel();
        });

        match pipeline.translate_document(&mut doc).await {
            Err(LebabError::Cancelled { completed, total }) => {
                // Cancelled at 75ms, while the second 50ms chunk is in flight
                assert_eq!(total, 5);
                assert_eq!(completed, 2);
            }
            other => panic!("Expected Cancelled, got {:?}", other),
        }
        assert_eq!(doc, before);
    }

    // ============================================================================
    // Custom document models
    // ============================================================================

    struct Unreadable {
        writes: usize,
    }

    impl TextSource for Unreadable {
        fn positions(&self) -> Vec<Address> {
            vec![Address::from("p[0]"), Address::from("p[1]")]
        }

        fn read(&self, address: &Address) -> Result<String, crate::document::DocumentError> {
            match address.as_str() {
                "p[0]" => Ok("readable".to_string()),
                _ => Err(crate::document::DocumentError::UnknownAddress(address.clone())),
            }
        }

        fn write(
            &mut self,
            _address: &Address,
            _text: &str,
        ) -> Result<(), crate::document::DocumentError> {
            self.writes += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unreadable_document_aborts_before_dispatch() {
        let mock = MockOracle::new(MockMode::Suffix);
        let mut doc = Unreadable { writes: 0 };

        let result = pipeline(&mock, config()).translate_document(&mut doc).await;

        assert!(matches!(result, Err(LebabError::Extraction(_))));
        assert_eq!(mock.calls(), 0);
        assert_eq!(doc.writes, 0);
    }

    struct PartlyLocked {
        texts: Vec<String>,
    }

    impl TextSource for PartlyLocked {
        fn positions(&self) -> Vec<Address> {
            (0..self.texts.len())
                .map(|i| Address::from_path(&[("p", i)]))
                .collect()
        }

        fn read(&self, address: &Address) -> Result<String, crate::document::DocumentError> {
            let index = address.segments().and_then(|s| s.first().map(|(_, i)| *i));
            index
                .and_then(|i| self.texts.get(i).cloned())
                .ok_or_else(|| crate::document::DocumentError::UnknownAddress(address.clone()))
        }

        fn write(
            &mut self,
            address: &Address,
            text: &str,
        ) -> Result<(), crate::document::DocumentError> {
            if address.as_str() == "p[1]" {
                return Err(crate::document::DocumentError::ReadOnly(address.clone()));
            }
            let index = address.segments().and_then(|s| s.first().map(|(_, i)| *i));
            match index.and_then(|i| self.texts.get_mut(i)) {
                Some(slot) => {
                    *slot = text.to_string();
                    Ok(())
                }
                None => Err(crate::document::DocumentError::UnknownAddress(address.clone())),
            }
        }
    }

    #[tokio::test]
    async fn test_write_failures_reported_per_address() {
        let mock = MockOracle::new(MockMode::Suffix);
        let mut doc = PartlyLocked {
            texts: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };

        let report = pipeline(&mock, config())
            .translate_document(&mut doc)
            .await
            .unwrap();

        assert_eq!(report.write_failures.len(), 1);
        assert_eq!(report.write_failures[0].address.as_str(), "p[1]");
        assert_eq!(doc.texts, vec!["a_es", "b", "c_es"]);
    }

    // ============================================================================
    // Real provider
    // ============================================================================

    #[tokio::test]
    #[ignore]
    async fn test_e2e_real_provider() {
        if std::env::var("OPENAI_API_KEY").is_err() {
            eprintln!("⚠️  Skipping: OPENAI_API_KEY not set");
            return;
        }

        let oracle = OpenAiOracle::from_env().expect("Failed to load provider");
        let pipeline = Pipeline::new(
            Arc::new(oracle),
            PipelineConfig::new("English", "Spanish").with_max_chunk_size(60),
        )
        .unwrap();

        let mut doc = sample_document();
        let report = pipeline.translate_document(&mut doc).await.unwrap();

        println!("📊 {:?}", report);
        println!("🌍 {:#?}", doc);
        assert_eq!(report.blocks, 7);
        assert!(report.write_failures.is_empty());
        assert_eq!(doc.paragraphs[1], "");
    }
}
