//! Translation oracle boundary
//!
//! The oracle is whatever turns a chunk of source text into target-language
//! text: an LLM behind an HTTP API, or a deterministic mock in tests. It is
//! untrusted with respect to output shape. Implementations return the raw
//! response text and leave decoding to [`crate::reconcile`], so a malformed
//! answer is never confused with a transport failure.
//!
//! # Example
//!
//! ```ignore
//! use lebab::oracle::{ChunkRequest, MockMode, MockOracle, TranslationOracle};
//!
//! let oracle = MockOracle::new(MockMode::Suffix);
//! let raw = oracle.translate(&ChunkRequest::from_chunk(&chunk), "en", "fr").await?;
//! ```

pub mod mock;
pub mod openai;

pub use mock::{MockMode, MockOracle};
pub use openai::OpenAiOracle;

use crate::block::Address;
use crate::chunk::Chunk;
use crate::error::{OracleError, OracleResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One `{address, text}` pair of a chunk request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    pub address: Address,
    pub text: String,
}

/// Ordered list of blocks to translate, serialized as a JSON array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkRequest {
    pub items: Vec<RequestItem>,
}

impl ChunkRequest {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            items: chunk
                .blocks
                .iter()
                .map(|block| RequestItem {
                    address: block.address.clone(),
                    text: block.source_text.clone(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// JSON body of the request: `[{"address": "p[0]", "text": "..."}, ...]`
    pub fn to_json(&self) -> String {
        // A Vec of string pairs always serializes
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Generic trait for translation providers
///
/// A call translates one whole chunk. It must not touch the document, and the
/// caller may retry it wholesale.
#[async_trait]
pub trait TranslationOracle: Send + Sync {
    /// Translate a chunk and return the provider's raw textual answer
    ///
    /// The answer is expected to be a JSON array with one entry per request
    /// item, in order, but nothing here enforces that.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Raw response, possibly malformed
    /// * `Err(OracleError)` - The provider could not be reached or refused the call
    async fn translate(
        &self,
        request: &ChunkRequest,
        source_locale: &str,
        target_locale: &str,
    ) -> OracleResult<String>;

    /// Name of the provider, for logging
    fn provider_name(&self) -> &str;
}

/// Check that a locale code contains only ASCII alphanumerics, `-` and `_`
pub fn validate_locale(locale: &str) -> OracleResult<()> {
    if locale.is_empty() {
        return Err(OracleError::InvalidLocale(
            "Locale code is empty".to_string(),
        ));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(OracleError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}
