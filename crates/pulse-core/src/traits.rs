//! Core traits for pulsecoach abstractions.
//!
//! These traits define the store and backend contracts that concrete
//! implementations must satisfy, enabling pluggable backends and
//! testability. The structured store and vector index are external services;
//! these are the only surfaces the core sees.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// STRUCTURED STORE TRAITS
// =============================================================================

/// Read-only access to imported daily health records.
#[async_trait]
pub trait HealthRecordStore: Send + Sync {
    /// Fetch the record for one date, if one exists.
    async fn get_record(&self, date: NaiveDate) -> Result<Option<DailyHealthRecord>>;

    /// Fetch all records in the inclusive range, ascending by date.
    ///
    /// Dates with no record are simply absent from the result; the store
    /// never fabricates zero-filled placeholders.
    async fn get_range(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<DailyHealthRecord>>;

    /// Rolling baseline averages over the trailing `window_days` ending at
    /// `as_of` (inclusive).
    async fn baselines(&self, as_of: NaiveDate, window_days: i64) -> Result<Baselines>;
}

/// Access to the singleton user profile.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self) -> Result<UserProfile>;
}

/// Append-only conversation turn persistence.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Persist one completed (or failed) turn. Sessions exist implicitly:
    /// the first turn for a session id creates it.
    async fn append_turn(&self, turn: &ConversationTurn) -> Result<()>;

    /// The last `n` turns for a session, oldest-first.
    async fn recent_turns(&self, session_id: &str, n: i64) -> Result<Vec<ConversationTurn>>;
}

/// Append-only alert persistence.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn append_alert(&self, alert: &Alert) -> Result<()>;
}

/// Append-only scheduled-job audit log.
#[async_trait]
pub trait JobLogStore: Send + Sync {
    async fn append_job_run(&self, run: &JobRun) -> Result<()>;
}

// =============================================================================
// VECTOR INDEX TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<pgvector::Vector>>;

    /// Expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// Semantic index over daily-summary embeddings.
///
/// The write path (`upsert_day`) is owned by the import pipeline; the query
/// path (`similar_days`) is what context retrieval calls.
#[async_trait]
pub trait DayEmbeddingIndex: Send + Sync {
    /// Insert or replace the embedding for one day's summary.
    async fn upsert_day(&self, date: NaiveDate, summary: &str) -> Result<()>;

    /// Top-k most similar historical days for a query text.
    async fn similar_days(&self, text: &str, k: i64) -> Result<Vec<SimilarDay>>;
}

// =============================================================================
// COMPLETION BACKEND TRAITS
// =============================================================================

/// Uniform contract over the three text-completion services.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for a prompt with system context.
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion>;

    /// Cheap availability probe; false means the caller should apply its
    /// fallback policy without attempting a completion.
    async fn is_available(&self) -> bool;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_objects_are_object_safe() {
        fn _record(_: &dyn HealthRecordStore) {}
        fn _profile(_: &dyn ProfileStore) {}
        fn _turns(_: &dyn TurnStore) {}
        fn _alerts(_: &dyn AlertStore) {}
        fn _jobs(_: &dyn JobLogStore) {}
        fn _index(_: &dyn DayEmbeddingIndex) {}
        fn _backend(_: &dyn CompletionBackend) {}
        fn _embed(_: &dyn EmbeddingBackend) {}
    }
}
