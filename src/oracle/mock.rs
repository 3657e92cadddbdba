//! Mock oracle for testing
//!
//! Deterministic, API-free oracle that can also misbehave on purpose
//! (dropping items, adding items, garbling output, failing calls) so the
//! reconciliation and retry paths can be exercised without network access.
//!
//! # Example
//!
//! ```ignore
//! use lebab::oracle::{MockMode, MockOracle, TranslationOracle};
//!
//! let mock = MockOracle::new(MockMode::Suffix);
//! let raw = mock.translate(&request, "en", "fr").await.unwrap();
//! // [{"address":"p[0]","text":"hello_fr"}]
//! ```

use super::{ChunkRequest, TranslationOracle};
use crate::error::{OracleError, OracleResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock behaviors
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix and echo addresses: "hello" → "hello_fr"
    Suffix,

    /// Suffix translation returned as a plain array of strings (no addresses)
    Positional,

    /// Suffix translation, but only the first `n` items are returned
    Truncate(usize),

    /// Suffix translation followed by `n` invented items
    Extra(usize),

    /// Suffix translation with addresses, items in reverse order
    Reverse,

    /// Suffix translation wrapped in a Markdown code fence
    Fenced,

    /// Return this text verbatim, whatever the request
    Raw(String),

    /// Fail every call with a service error
    Error(String),

    /// Echo the source text with addresses
    NoOp,
}

/// Mock oracle that simulates well-behaved and misbehaving providers
#[derive(Debug, Clone)]
pub struct MockOracle {
    mode: MockMode,
    /// Simulated latency of a call (in milliseconds)
    delay_ms: u64,
    /// Divide the delay by the call number, so later calls finish first
    staggered: bool,
    /// Number of initial calls that fail with a network error
    fail_first: usize,
    calls: Arc<AtomicUsize>,
}

impl MockOracle {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            staggered: false,
            fail_first: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock whose every call takes about `delay_ms`
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Create a mock where call `n` (zero-based) sleeps `delay_ms / (n + 1)`
    ///
    /// Used to make concurrently dispatched chunks complete out of order.
    pub fn staggered(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            staggered: true,
            ..Self::new(mode)
        }
    }

    /// Fail the first `n` calls with a network error before behaving normally
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Number of `translate` calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn apply_delay(&self, call: usize) {
        let delay = if self.staggered {
            self.delay_ms / (call as u64 + 1)
        } else {
            self.delay_ms
        };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn suffixed(request: &ChunkRequest, target: &str) -> Vec<serde_json::Value> {
        request
            .items
            .iter()
            .map(|item| json!({"address": item.address, "text": format!("{}_{}", item.text, target)}))
            .collect()
    }

    fn respond(&self, request: &ChunkRequest, target: &str) -> OracleResult<String> {
        let body = match &self.mode {
            MockMode::Suffix => json!(Self::suffixed(request, target)),
            MockMode::Positional => json!(
                request
                    .items
                    .iter()
                    .map(|item| format!("{}_{}", item.text, target))
                    .collect::<Vec<_>>()
            ),
            MockMode::Truncate(n) => {
                let mut items = Self::suffixed(request, target);
                items.truncate(*n);
                json!(items)
            }
            MockMode::Extra(n) => {
                let mut items = Self::suffixed(request, target);
                for i in 0..*n {
                    items.push(json!({"text": format!("invented {}", i)}));
                }
                json!(items)
            }
            MockMode::Reverse => {
                let mut items = Self::suffixed(request, target);
                items.reverse();
                json!(items)
            }
            MockMode::Fenced => {
                let items = json!(Self::suffixed(request, target));
                return Ok(format!("```json\n{}\n```", items));
            }
            MockMode::Raw(text) => return Ok(text.clone()),
            MockMode::Error(msg) => return Err(OracleError::ServiceError(msg.clone())),
            MockMode::NoOp => json!(request.items),
        };
        Ok(body.to_string())
    }
}

#[async_trait]
impl TranslationOracle for MockOracle {
    async fn translate(
        &self,
        request: &ChunkRequest,
        _source_locale: &str,
        target_locale: &str,
    ) -> OracleResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.apply_delay(call).await;

        if call < self.fail_first {
            return Err(OracleError::NetworkError(format!(
                "simulated outage on call {}",
                call
            )));
        }

        self.respond(request, target_locale)
    }

    fn provider_name(&self) -> &str {
        "Mock Oracle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Address;
    use crate::oracle::RequestItem;

    fn request(texts: &[&str]) -> ChunkRequest {
        ChunkRequest {
            items: texts
                .iter()
                .enumerate()
                .map(|(i, text)| RequestItem {
                    address: Address::from_path(&[("p", i)]),
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    fn parse(raw: &str) -> serde_json::Value {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn test_suffix_echoes_addresses() {
        let mock = MockOracle::new(MockMode::Suffix);
        let raw = mock
            .translate(&request(&["hello", "world"]), "en", "fr")
            .await
            .unwrap();
        assert_eq!(
            parse(&raw),
            json!([
                {"address": "p[0]", "text": "hello_fr"},
                {"address": "p[1]", "text": "world_fr"}
            ])
        );
    }

    #[tokio::test]
    async fn test_positional_returns_strings() {
        let mock = MockOracle::new(MockMode::Positional);
        let raw = mock.translate(&request(&["a", "b"]), "en", "de").await.unwrap();
        assert_eq!(parse(&raw), json!(["a_de", "b_de"]));
    }

    #[tokio::test]
    async fn test_truncate_drops_trailing_items() {
        let mock = MockOracle::new(MockMode::Truncate(1));
        let raw = mock.translate(&request(&["a", "b", "c"]), "en", "de").await.unwrap();
        assert_eq!(parse(&raw).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_extra_adds_items() {
        let mock = MockOracle::new(MockMode::Extra(2));
        let raw = mock.translate(&request(&["a"]), "en", "de").await.unwrap();
        assert_eq!(parse(&raw).as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reverse_keeps_addresses_attached() {
        let mock = MockOracle::new(MockMode::Reverse);
        let raw = mock.translate(&request(&["a", "b"]), "en", "de").await.unwrap();
        assert_eq!(
            parse(&raw),
            json!([
                {"address": "p[1]", "text": "b_de"},
                {"address": "p[0]", "text": "a_de"}
            ])
        );
    }

    #[tokio::test]
    async fn test_fenced_wraps_json() {
        let mock = MockOracle::new(MockMode::Fenced);
        let raw = mock.translate(&request(&["a"]), "en", "de").await.unwrap();
        assert!(raw.starts_with("```json\n"));
        assert!(raw.ends_with("\n```"));
    }

    #[tokio::test]
    async fn test_raw_and_noop() {
        let mock = MockOracle::new(MockMode::Raw("Sorry, I cannot help".to_string()));
        let raw = mock.translate(&request(&["a"]), "en", "de").await.unwrap();
        assert_eq!(raw, "Sorry, I cannot help");

        let mock = MockOracle::new(MockMode::NoOp);
        let raw = mock.translate(&request(&["a"]), "en", "de").await.unwrap();
        assert_eq!(parse(&raw), json!([{"address": "p[0]", "text": "a"}]));
    }

    #[tokio::test]
    async fn test_error_mode_returns_error() {
        let mock = MockOracle::new(MockMode::Error("API unavailable".to_string()));
        match mock.translate(&request(&["a"]), "en", "fr").await {
            Err(OracleError::ServiceError(msg)) => assert_eq!(msg, "API unavailable"),
            other => panic!("Expected ServiceError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_first_then_recovers() {
        let mock = MockOracle::new(MockMode::Suffix).failing_first(2);
        let req = request(&["a"]);
        assert!(mock.translate(&req, "en", "fr").await.is_err());
        assert!(mock.translate(&req, "en", "fr").await.is_err());
        assert!(mock.translate(&req, "en", "fr").await.is_ok());
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_call_counter_is_shared_between_clones() {
        let mock = MockOracle::new(MockMode::Suffix);
        let clone = mock.clone();
        clone.translate(&request(&["a"]), "en", "fr").await.unwrap();
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_delay_adds_latency() {
        let mock = MockOracle::with_delay(MockMode::Suffix, 50);
        let start = std::time::Instant::now();
        mock.translate(&request(&["a"]), "en", "fr").await.unwrap();
        assert!(start.elapsed().as_millis() >= 50);
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(MockOracle::new(MockMode::Suffix).provider_name(), "Mock Oracle");
    }
}
