//! # pulse-inference
//!
//! Completion and embedding backend abstraction for pulsecoach.
//!
//! Three interchangeable completion backends sit behind the
//! `CompletionBackend` trait from pulse-core:
//! - Ollama (local; the only backend allowed for sensitive queries)
//! - OpenAI (validation; structured output and mid-tier queries)
//! - Anthropic (reasoning; high-complexity queries)
//!
//! `ModelRouter` is the pure policy that picks between them.

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod router;

pub use anthropic::AnthropicBackend;
pub use mock::{MockCompletionBackend, MockEmbeddingBackend};
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use router::{ModelRouter, RouterConfig};
