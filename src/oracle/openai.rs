//! OpenAI-compatible chat completions oracle
//!
//! Sends each chunk as a JSON array inside a translation prompt and returns
//! the model's message content untouched. Any endpoint speaking the chat
//! completions protocol works (OpenAI, Azure proxies, local servers).
//!
//! # Configuration
//!
//! - `OPENAI_API_KEY` (required)
//! - `LEBAB_API_URL` (default `https://api.openai.com/v1/chat/completions`)
//! - `LEBAB_MODEL` (default `gpt-4`)

use super::{ChunkRequest, TranslationOracle, validate_locale};
use crate::error::{OracleError, OracleResult};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";

const SYSTEM_PROMPT: &str = "You are a professional translator of many different languages. \
Your skill is the ability to strike a good balance between semantic and communicative translation.";

#[derive(Clone)]
pub struct OpenAiOracle {
    api_key: String,
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl OpenAiOracle {
    pub fn new(api_key: String) -> OracleResult<Self> {
        if api_key.trim().is_empty() {
            return Err(OracleError::ConfigError(
                "API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| {
                OracleError::NetworkError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key,
            client,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create an oracle from `OPENAI_API_KEY`, `LEBAB_API_URL` and `LEBAB_MODEL`
    pub fn from_env() -> OracleResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            OracleError::ConfigError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let mut oracle = Self::new(api_key)?;
        if let Ok(url) = std::env::var("LEBAB_API_URL") {
            oracle = oracle.with_api_url(&url);
        }
        if let Ok(model) = std::env::var("LEBAB_MODEL") {
            oracle = oracle.with_model(&model);
        }
        Ok(oracle)
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn build_prompt(request: &ChunkRequest, source_locale: &str, target_locale: &str) -> String {
        format!(
            "Translate the following JSON array from {source} to {target}: {json}\n\n\
Each element has an \"address\" and a \"text\". Translate only the \"text\" values and \
copy every \"address\" unchanged. Return a JSON array with exactly {count} elements in the \
same order. Do not merge, split, add or drop elements. Return only the JSON array, \
without any commentary.",
            source = source_locale,
            target = target_locale,
            json = request.to_json(),
            count = request.len(),
        )
    }

    fn build_body(&self, request: &ChunkRequest, source_locale: &str, target_locale: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::build_prompt(request, source_locale, target_locale)}
            ]
        })
    }
}

impl std::fmt::Debug for OpenAiOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiOracle")
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TranslationOracle for OpenAiOracle {
    async fn translate(
        &self,
        request: &ChunkRequest,
        source_locale: &str,
        target_locale: &str,
    ) -> OracleResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        let body = self.build_body(request, source_locale, target_locale);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(if status.is_client_error() {
                OracleError::ConfigError(format!("API client error ({}): {}", status, error_text))
            } else {
                OracleError::ServiceError(format!("API server error ({}): {}", status, error_text))
            });
        }

        // A broken envelope is a service failure; the message content itself
        // goes to the reconciler unchecked.
        let envelope: serde_json::Value = response.json().await.map_err(|e| {
            OracleError::ServiceError(format!("Failed to parse API response: {}", e))
        })?;

        envelope["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                OracleError::ServiceError(
                    "Invalid API response: missing 'choices[0].message.content'".to_string(),
                )
            })
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}
