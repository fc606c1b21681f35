//! # pulse-engine
//!
//! Query orchestration and coaching pipelines for pulsecoach.
//!
//! This crate provides:
//! - Rule-based intent classification with date-scope resolution
//! - Per-query context retrieval with independent field degradation
//! - Prompt assembly and reply verification against the retrieved evidence
//! - The conversation pipeline (classify, retrieve, route, invoke, persist)
//! - The counterfactual blood-pressure model with Monte Carlo intervals
//! - Scheduled jobs: morning briefing, weekly report, alert scan
//!
//! ## Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use pulse_core::BackendId;
//! use pulse_engine::{CoachStores, HealthCoach};
//! use pulse_inference::{ModelRouter, OllamaBackend};
//!
//! let mut backends: HashMap<_, Arc<dyn pulse_core::CompletionBackend>> = HashMap::new();
//! backends.insert(BackendId::Local, Arc::new(OllamaBackend::from_env()));
//!
//! let coach = HealthCoach::new(stores, backends, ModelRouter::new());
//! let reply = coach.answer_query("What was my BP yesterday?", "session-1").await;
//! println!("{}", reply.text);
//! ```

pub mod alerts;
pub mod briefing;
pub mod coach;
pub mod context;
pub mod conversation;
pub mod intent;
pub mod postprocess;
pub mod prompt;
pub mod report;
pub mod scenario;

// Re-export core types
pub use pulse_core::*;

// Re-export pipeline types
pub use coach::{CoachStores, HealthCoach};
pub use context::ContextRetriever;
pub use conversation::{
    ConversationConfig, ConversationManager, PRIVACY_LOCKOUT_MESSAGE, UNAVAILABLE_MESSAGE,
};
pub use intent::{classify, Classification};
pub use postprocess::{verify_reply, PostProcessed};
pub use prompt::{build_prompt, Prompt};

// Re-export model and job types
pub use alerts::AlertScanner;
pub use briefing::{Briefing, DailyBriefingGenerator};
pub use report::{WeekStats, WeekTrend, WeeklyReport, WeeklyReportGenerator};
pub use scenario::{ScenarioConfig, ScenarioEngine};
