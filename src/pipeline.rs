//! Translation pipeline
//!
//! Drives a run end to end:
//!
//! 1. extract blocks from the document (a read failure aborts the run)
//! 2. plan size-bounded chunks
//! 3. send each chunk to the oracle, at most `concurrency` at a time, and
//!    reconcile the answer
//! 4. release reconciled chunks in their original order
//! 5. write every block back to the document, once
//!
//! The document is only written after every chunk has been reconciled, so a
//! cancelled or aborted run leaves it untouched.

use crate::block::Block;
use crate::chunk::{Chunk, ChunkPlanner};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::document::TextSource;
use crate::error::{LebabError, LebabResult, OracleError};
use crate::extract::extract_blocks;
use crate::oracle::{ChunkRequest, TranslationOracle};
use crate::reconcile::{Anomaly, Reconciled, fallback, reconcile};
use crate::writer::{WriteFailure, write_blocks};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag shared between a caller and a running pipeline
///
/// Cancellation is checked at chunk boundaries: chunks already in flight
/// finish, chunks not yet dispatched are skipped and the run fails with
/// [`LebabError::Cancelled`] before anything is written.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The document had no translatable text; the oracle was never called
    NothingToTranslate,
    Translated,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: Outcome,
    pub blocks: usize,
    pub chunks: usize,
    /// Blocks whose text came from the oracle
    pub translated: usize,
    pub anomalies: Vec<Anomaly>,
    pub write_failures: Vec<WriteFailure>,
}

impl RunReport {
    fn nothing_to_translate() -> Self {
        Self {
            outcome: Outcome::NothingToTranslate,
            blocks: 0,
            chunks: 0,
            translated: 0,
            anomalies: Vec::new(),
            write_failures: Vec::new(),
        }
    }

    /// Blocks that kept their source text
    pub fn untranslated(&self) -> usize {
        self.blocks - self.translated
    }
}

/// Blocks translated by [`Pipeline::translate_blocks`], in original order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedBlocks {
    pub blocks: Vec<Block>,
    pub chunks: usize,
    pub translated: usize,
    pub anomalies: Vec<Anomaly>,
}

enum ChunkOutcome {
    Done(Reconciled),
    Skipped,
}

pub struct Pipeline {
    oracle: Arc<dyn TranslationOracle>,
    config: PipelineConfig,
    cancel: CancelHandle,
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn TranslationOracle>, config: PipelineConfig) -> LebabResult<Self> {
        config.validate()?;
        Ok(Self {
            oracle,
            config,
            cancel: CancelHandle::new(),
        })
    }

    /// Use a caller-owned cancellation handle
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Translate `document` in place
    pub async fn translate_document<D: TextSource + ?Sized>(
        &self,
        document: &mut D,
    ) -> LebabResult<RunReport> {
        let blocks = extract_blocks(&*document)?;
        info!(
            blocks = blocks.len(),
            provider = self.oracle.provider_name(),
            source = %self.config.source_locale,
            target = %self.config.target_locale,
            "starting translation run"
        );

        if blocks.is_empty() {
            info!("nothing to translate");
            return Ok(RunReport::nothing_to_translate());
        }

        let block_count = blocks.len();
        let result = self.translate_blocks(blocks).await?;
        let write_failures = write_blocks(document, &result.blocks);

        info!(
            blocks = block_count,
            chunks = result.chunks,
            translated = result.translated,
            anomalies = result.anomalies.len(),
            write_failures = write_failures.len(),
            "translation run finished"
        );

        Ok(RunReport {
            outcome: Outcome::Translated,
            blocks: block_count,
            chunks: result.chunks,
            translated: result.translated,
            anomalies: result.anomalies,
            write_failures,
        })
    }

    /// Translate already extracted blocks without touching any document
    pub async fn translate_blocks(&self, blocks: Vec<Block>) -> LebabResult<TranslatedBlocks> {
        let planner = ChunkPlanner::new(self.config.max_chunk_size)?
            .with_separator_overhead(self.config.separator_overhead);
        let chunks = planner.plan(blocks);
        let total = chunks.len();

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let aborted = AtomicBool::new(false);

        // join_all yields results in input order, whatever the completion order
        let tasks = chunks.into_iter().map(|chunk| {
            let semaphore = Arc::clone(&semaphore);
            let aborted = &aborted;
            async move {
                let _permit = semaphore.acquire().await.map_err(|e| {
                    LebabError::Config(format!("chunk dispatcher closed: {}", e))
                })?;
                if self.cancel.is_cancelled() || aborted.load(Ordering::SeqCst) {
                    debug!(chunk = chunk.index, "skipping chunk");
                    return Ok(ChunkOutcome::Skipped);
                }
                let result = self.process_chunk(chunk).await;
                if result.is_err() {
                    aborted.store(true, Ordering::SeqCst);
                }
                result.map(ChunkOutcome::Done)
            }
        });
        let results = join_all(tasks).await;

        let mut blocks = Vec::new();
        let mut anomalies = Vec::new();
        let mut translated = 0;
        let mut completed = 0;
        let mut skipped = false;

        for result in results {
            match result? {
                ChunkOutcome::Done(reconciled) => {
                    completed += 1;
                    translated += reconciled.translated;
                    anomalies.extend(reconciled.anomalies);
                    blocks.extend(reconciled.blocks);
                }
                ChunkOutcome::Skipped => skipped = true,
            }
        }

        if skipped {
            warn!(completed, total, "translation run cancelled");
            return Err(LebabError::Cancelled { completed, total });
        }

        Ok(TranslatedBlocks {
            blocks,
            chunks: total,
            translated,
            anomalies,
        })
    }

    /// Send one chunk to the oracle, retrying wholesale on transport failure
    async fn process_chunk(&self, chunk: Chunk) -> LebabResult<Reconciled> {
        let request = ChunkRequest::from_chunk(&chunk);
        let mut attempt: u32 = 0;

        loop {
            debug!(
                chunk = chunk.index,
                blocks = chunk.len(),
                size = chunk.size(),
                attempt,
                "dispatching chunk"
            );

            match self
                .oracle
                .translate(&request, &self.config.source_locale, &self.config.target_locale)
                .await
            {
                Ok(raw) => return Ok(reconcile(chunk, &raw)),
                Err(e) if attempt < self.config.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    warn!(chunk = chunk.index, attempt, error = %e, "oracle call failed, retrying");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(e) => {
                    return match self.config.on_transport_failure {
                        FailurePolicy::Abort => Err(LebabError::Oracle {
                            chunk: chunk.index,
                            source: e,
                        }),
                        FailurePolicy::Fallback => Ok(fallback(chunk, &e.to_string())),
                    };
                }
            }
        }
    }
}

/// Only network and service failures are retried
fn is_retryable(error: &OracleError) -> bool {
    matches!(
        error,
        OracleError::NetworkError(_) | OracleError::ServiceError(_)
    )
}
