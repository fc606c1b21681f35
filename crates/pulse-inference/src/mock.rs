//! Mock backends for deterministic testing.
//!
//! Implements the completion and embedding contracts with scripted
//! responses, switchable availability, and a call log so tests can assert
//! which backends were touched and with what input.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pulse_core::{Completion, CompletionBackend, EmbeddingBackend, Error, Result};

/// One logged backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

/// Mock completion backend for testing.
#[derive(Clone)]
pub struct MockCompletionBackend {
    config: Arc<MockConfig>,
    available: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    model: String,
    fixed_responses: HashMap<String, String>,
    default_response: String,
    input_tokens: i64,
    output_tokens: i64,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            model: "mock-model".to_string(),
            fixed_responses: HashMap::new(),
            default_response: "Mock response".to_string(),
            input_tokens: 100,
            output_tokens: 50,
            latency_ms: 0,
        }
    }
}

impl MockCompletionBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            available: Arc::new(AtomicBool::new(true)),
            failing: Arc::new(AtomicBool::new(false)),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the reported model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    /// Set the default response for all prompts.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Add a response for prompts containing a specific substring.
    pub fn with_response_mapping(
        mut self,
        prompt_contains: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(prompt_contains.into(), response.into());
        self
    }

    /// Set reported token counts.
    pub fn with_token_counts(mut self, input: i64, output: i64) -> Self {
        let config = Arc::make_mut(&mut self.config);
        config.input_tokens = input;
        config.output_tokens = output;
        self
    }

    /// Set simulated latency for completions.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Start in the unavailable state.
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    /// Flip availability at runtime.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every completion return an error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All logged calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of completion calls made.
    pub fn complete_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "complete")
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }
}

impl Default for MockCompletionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletionBackend {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<Completion> {
        self.log_call("complete", prompt);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Backend("simulated failure".to_string()));
        }

        let text = self
            .config
            .fixed_responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.config.default_response.clone());

        Ok(Completion {
            text,
            model: self.config.model.clone(),
            input_tokens: self.config.input_tokens,
            output_tokens: self.config.output_tokens,
        })
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Mock embedding backend producing deterministic vectors from text bytes.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    dimension: usize,
    model: String,
}

impl MockEmbeddingBackend {
    pub fn new() -> Self {
        Self {
            dimension: pulse_core::defaults::EMBED_DIMENSION,
            model: "mock-embed".to_string(),
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Deterministic unit-normalized vector derived from text content.
    fn generate(&self, text: &str) -> pgvector::Vector {
        let bytes = text.as_bytes();
        let mut values: Vec<f32> = (0..self.dimension)
            .map(|i| {
                let b = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
                (b as f32 + i as f32).sin()
            })
            .collect();

        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }
        pgvector::Vector::from(values)
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<pgvector::Vector>> {
        Ok(texts.iter().map(|t| self.generate(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_response_is_returned() {
        let backend = MockCompletionBackend::new().with_fixed_response("hello");
        let completion = backend.complete("", "anything").await.unwrap();
        assert_eq!(completion.text, "hello");
        assert_eq!(backend.complete_call_count(), 1);
    }

    #[tokio::test]
    async fn response_mapping_matches_substring() {
        let backend = MockCompletionBackend::new()
            .with_fixed_response("default")
            .with_response_mapping("blood pressure", "BP answer");

        let c = backend.complete("", "what is my blood pressure").await.unwrap();
        assert_eq!(c.text, "BP answer");

        let c = backend.complete("", "something else").await.unwrap();
        assert_eq!(c.text, "default");
    }

    #[tokio::test]
    async fn failing_backend_errors() {
        let backend = MockCompletionBackend::new();
        backend.set_failing(true);
        assert!(backend.complete("", "x").await.is_err());

        backend.set_failing(false);
        assert!(backend.complete("", "x").await.is_ok());
    }

    #[tokio::test]
    async fn availability_switch() {
        let backend = MockCompletionBackend::new().unavailable();
        assert!(!backend.is_available().await);
        backend.set_available(true);
        assert!(backend.is_available().await);
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let backend = MockEmbeddingBackend::new().with_dimension(16);
        let a = backend.embed_texts(&["same text".to_string()]).await.unwrap();
        let b = backend.embed_texts(&["same text".to_string()]).await.unwrap();
        assert_eq!(a[0].as_slice(), b[0].as_slice());
        assert_eq!(a[0].as_slice().len(), 16);
    }
}
