//! Anthropic reasoning backend implementation.
//!
//! Handles high-complexity queries: multi-factor explanations, predictions,
//! and scenario narration.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pulse_core::{defaults, Completion, CompletionBackend, Error, Result};

/// Default Anthropic API base URL.
pub const DEFAULT_ANTHROPIC_URL: &str = defaults::ANTHROPIC_URL;

/// Default reasoning model.
pub const DEFAULT_MODEL: &str = defaults::REASONING_MODEL;

/// Anthropic messages-API backend.
pub struct AnthropicBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend with an explicit key and defaults.
    pub fn new(api_key: String) -> Self {
        Self::with_config(
            DEFAULT_ANTHROPIC_URL.to_string(),
            api_key,
            DEFAULT_MODEL.to_string(),
        )
    }

    /// Create a new Anthropic backend with custom configuration.
    pub fn with_config(base_url: String, api_key: String, model: String) -> Self {
        let timeout = std::env::var("PULSE_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            "Initializing Anthropic backend: url={}, model={}",
            base_url, model
        );

        Self {
            client,
            base_url,
            api_key,
            model,
            timeout_secs: timeout,
        }
    }

    /// Create from environment variables. Errors when `ANTHROPIC_API_KEY` is
    /// unset; the router treats a missing backend as unavailable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            Error::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        let base_url =
            std::env::var("ANTHROPIC_BASE").unwrap_or_else(|_| DEFAULT_ANTHROPIC_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::with_config(base_url, api_key, model))
    }
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: i64,
    #[serde(default)]
    output_tokens: i64,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    #[instrument(skip(self, system, prompt), fields(subsystem = "inference", component = "anthropic", op = "complete", model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion> {
        let start = Instant::now();

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: defaults::MAX_COMPLETION_TOKENS,
            system: system.to_string(),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "Anthropic returned {}: {}",
                status, body
            )));
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("Failed to parse response: {}", e)))?;

        let text = result
            .content
            .into_iter()
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(Error::Backend("Anthropic returned no content".to_string()));
        }

        debug!(
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion complete"
        );

        Ok(Completion {
            text,
            model: self.model.clone(),
            input_tokens: result.usage.input_tokens,
            output_tokens: result.usage.output_tokens,
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        // The messages endpoint rejects GETs, but any HTTP response at all
        // proves the service is reachable and the key is attached.
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .timeout(Duration::from_secs(defaults::HEALTH_CHECK_TIMEOUT_SECS))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("Anthropic availability probe failed: {}", resp.status());
                false
            }
            Err(e) => {
                warn!("Anthropic availability probe error: {}", e);
                false
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
