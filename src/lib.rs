//! Structure-preserving document translation
//!
//! `lebab` translates documents without touching their structure. Text is
//! pulled out of the document as addressable blocks, grouped into
//! size-bounded chunks, sent to a translation oracle (an LLM or any other
//! service), reconciled with whatever came back, and written to the exact
//! positions it was taken from.
//!
//! # Workflow Example
//!
//! ```ignore
//! use lebab::{OpenAiOracle, Pipeline, PipelineConfig, WordDocument, document};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut doc: WordDocument = document::load_json("report.json".as_ref())?;
//!
//!     let oracle = Arc::new(OpenAiOracle::from_env()?);
//!     let config = PipelineConfig::new("en", "es").with_concurrency(4);
//!     let pipeline = Pipeline::new(oracle, config)?;
//!
//!     let report = pipeline.translate_document(&mut doc).await?;
//!     for anomaly in &report.anomalies {
//!         eprintln!("{}", anomaly);
//!     }
//!
//!     document::save_json(&doc, "report_es.json".as_ref())?;
//!     Ok(())
//! }
//! ```

pub mod block;
pub mod chunk;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod oracle;
pub mod pipeline;
pub mod reconcile;
pub mod writer;

#[cfg(test)]
mod integration_tests;

pub use block::{Address, Block};
pub use chunk::{Chunk, ChunkPlanner};
pub use config::{DEFAULT_MAX_CHUNK_SIZE, FailurePolicy, PipelineConfig};
pub use document::{DocumentError, SlideDeck, TextSource, WordDocument};
pub use error::{LebabError, LebabResult, OracleError, OracleResult};
pub use extract::{extract, extract_blocks};
pub use oracle::{ChunkRequest, MockMode, MockOracle, OpenAiOracle, TranslationOracle};
pub use pipeline::{CancelHandle, Outcome, Pipeline, RunReport};
pub use reconcile::{Anomaly, AnomalyKind, Severity, reconcile};
pub use writer::{WriteFailure, write_blocks};
