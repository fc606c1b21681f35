//! OpenAI validation backend implementation.
//!
//! Serves mid-tier queries and anything needing structured output.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pulse_core::{defaults, Completion, CompletionBackend, Error, Result};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_URL: &str = defaults::OPENAI_URL;

/// Default validation model.
pub const DEFAULT_MODEL: &str = defaults::VALIDATION_MODEL;

/// OpenAI chat-completions backend.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiBackend {
    /// Create a new OpenAI backend with an explicit key and defaults.
    pub fn new(api_key: String) -> Self {
        Self::with_config(DEFAULT_OPENAI_URL.to_string(), api_key, DEFAULT_MODEL.to_string())
    }

    /// Create a new OpenAI backend with custom configuration.
    pub fn with_config(base_url: String, api_key: String, model: String) -> Self {
        let timeout = std::env::var("PULSE_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        info!("Initializing OpenAI backend: url={}, model={}", base_url, model);

        Self {
            client,
            base_url,
            api_key,
            model,
            timeout_secs: timeout,
        }
    }

    /// Create from environment variables. Errors when `OPENAI_API_KEY` is
    /// unset; the router treats a missing backend as unavailable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY environment variable not set".to_string()))?;
        let base_url =
            std::env::var("OPENAI_BASE").unwrap_or_else(|_| DEFAULT_OPENAI_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::with_config(base_url, api_key, model))
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    #[instrument(skip(self, system, prompt), fields(subsystem = "inference", component = "openai", op = "complete", model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion> {
        let start = Instant::now();

        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: defaults::MAX_COMPLETION_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Backend(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "OpenAI returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("Failed to parse response: {}", e)))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Backend("OpenAI returned no choices".to_string()))?;

        debug!(
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion complete"
        );

        Ok(Completion {
            text,
            model: self.model.clone(),
            input_tokens: result.usage.prompt_tokens,
            output_tokens: result.usage.completion_tokens,
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .timeout(Duration::from_secs(defaults::HEALTH_CHECK_TIMEOUT_SECS))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("OpenAI availability probe failed: {}", resp.status());
                false
            }
            Err(e) => {
                warn!("OpenAI availability probe error: {}", e);
                false
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_OPENAI_URL, "https://api.openai.com/v1");
        assert_eq!(DEFAULT_MODEL, "gpt-4-turbo");
    }

    #[tokio::test]
    async fn empty_key_is_never_available() {
        let backend = OpenAiBackend::with_config(
            "http://127.0.0.1:1".to_string(),
            String::new(),
            DEFAULT_MODEL.to_string(),
        );
        assert!(!backend.is_available().await);
    }
}
