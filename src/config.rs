//! Pipeline configuration
//!
//! Everything the pipeline needs to know about a run besides the document and
//! the oracle. Language tags are passed through to the oracle untouched; they
//! are only checked for stray characters.

use crate::error::{LebabError, LebabResult};
use crate::oracle::validate_locale;
use std::str::FromStr;
use std::time::Duration;

/// Default chunk budget, in characters
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4000;

/// What to do with a chunk whose oracle call failed after all retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run; the document is not written
    Abort,
    /// Keep the chunk's source text and carry on
    #[default]
    Fallback,
}

impl FromStr for FailurePolicy {
    type Err = LebabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "fallback" => Ok(FailurePolicy::Fallback),
            other => Err(LebabError::Config(format!(
                "unknown failure policy '{}' (expected 'abort' or 'fallback')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Chunk budget in characters
    pub max_chunk_size: usize,
    /// Characters charged per additional block in a chunk (request framing)
    pub separator_overhead: usize,
    pub source_locale: String,
    pub target_locale: String,
    /// Chunks in flight at once; 1 translates strictly one after another
    pub concurrency: usize,
    /// Wholesale retries of a chunk after a transport failure
    pub max_retries: u32,
    /// Pause before retry `n` is `retry_backoff * n`
    pub retry_backoff: Duration,
    pub on_transport_failure: FailurePolicy,
}

impl PipelineConfig {
    pub fn new(source_locale: &str, target_locale: &str) -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            separator_overhead: 0,
            source_locale: source_locale.to_string(),
            target_locale: target_locale.to_string(),
            concurrency: 1,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            on_transport_failure: FailurePolicy::default(),
        }
    }

    /// Build a configuration, overriding defaults from the environment
    ///
    /// Reads `LEBAB_MAX_CHUNK_SIZE`, `LEBAB_CONCURRENCY`, `LEBAB_MAX_RETRIES`
    /// and `LEBAB_ON_FAILURE` (`abort` or `fallback`).
    pub fn from_env(source_locale: &str, target_locale: &str) -> LebabResult<Self> {
        let mut config = Self::new(source_locale, target_locale);

        if let Some(size) = env_parse::<usize>("LEBAB_MAX_CHUNK_SIZE")? {
            config.max_chunk_size = size;
        }
        if let Some(concurrency) = env_parse::<usize>("LEBAB_CONCURRENCY")? {
            config.concurrency = concurrency;
        }
        if let Some(retries) = env_parse::<u32>("LEBAB_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Ok(policy) = std::env::var("LEBAB_ON_FAILURE") {
            config.on_transport_failure = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    pub fn with_separator_overhead(mut self, overhead: usize) -> Self {
        self.separator_overhead = overhead;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_transport_failure = policy;
        self
    }

    pub fn validate(&self) -> LebabResult<()> {
        if self.max_chunk_size == 0 {
            return Err(LebabError::Config(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(LebabError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        validate_locale(&self.source_locale)
            .map_err(|e| LebabError::Config(format!("source locale: {}", e)))?;
        validate_locale(&self.target_locale)
            .map_err(|e| LebabError::Config(format!("target locale: {}", e)))?;
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> LebabResult<Option<T>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LebabError::Config(format!("{} has invalid value '{}'", key, value))),
        Err(_) => Ok(None),
    }
}
