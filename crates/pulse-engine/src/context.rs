//! Per-query context assembly.
//!
//! Pulls the evidence a prompt needs from the structured store and the
//! vector index. Every field degrades independently: a store failure
//! empties that field and records it in the bundle's degraded list, but
//! never blocks the query.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use pulse_core::{
    defaults, last_n_days, ContextBundle, DateScope, DayEmbeddingIndex, HealthRecordStore,
    Intent, ProfileStore, TurnStore,
};

/// Assembles a fresh ContextBundle per query. Read-only; never mutates
/// session state.
pub struct ContextRetriever {
    records: Arc<dyn HealthRecordStore>,
    profile: Arc<dyn ProfileStore>,
    turns: Arc<dyn TurnStore>,
    index: Arc<dyn DayEmbeddingIndex>,
    similar_days_k: i64,
    history_turns: i64,
}

impl ContextRetriever {
    pub fn new(
        records: Arc<dyn HealthRecordStore>,
        profile: Arc<dyn ProfileStore>,
        turns: Arc<dyn TurnStore>,
        index: Arc<dyn DayEmbeddingIndex>,
    ) -> Self {
        Self {
            records,
            profile,
            turns,
            index,
            similar_days_k: defaults::SIMILAR_DAYS_K,
            history_turns: defaults::HISTORY_TURNS,
        }
    }

    /// Raise the similar-day count, capped at the configured maximum.
    pub fn with_similar_days_k(mut self, k: i64) -> Self {
        self.similar_days_k = k.clamp(1, defaults::SIMILAR_DAYS_K_MAX);
        self
    }

    /// Build the evidence bundle for one query.
    pub async fn retrieve(
        &self,
        intent: Intent,
        date_scope: Option<DateScope>,
        query_text: &str,
        session_id: &str,
        today: NaiveDate,
    ) -> ContextBundle {
        let mut bundle = ContextBundle::default();

        match self.profile.get_profile().await {
            Ok(profile) => bundle.profile = Some(profile),
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    op = "retrieve",
                    session_id = %session_id,
                    "Profile unavailable: {}",
                    e
                );
                bundle.degraded.push("profile".to_string());
            }
        }

        match self
            .records
            .baselines(today, defaults::BASELINE_WINDOW_DAYS)
            .await
        {
            Ok(baselines) => bundle.baselines = Some(baselines),
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    op = "retrieve",
                    session_id = %session_id,
                    "Baselines unavailable: {}",
                    e
                );
                bundle.degraded.push("baselines".to_string());
            }
        }

        // Comparison queries with no explicit scope read a wider window so
        // weekday/weekend splits have enough days on each side.
        let scope = date_scope.or_else(|| match intent {
            Intent::Comparison => Some(last_n_days(
                today,
                defaults::COMPARISON_WINDOW_DAYS as u64,
            )),
            _ => None,
        });

        if let Some(scope) = scope {
            let (start, end) = scope.bounds();
            match self.records.get_range(start, end).await {
                Ok(records) => bundle.records = records,
                Err(e) => {
                    warn!(
                        subsystem = "engine",
                        op = "retrieve",
                        session_id = %session_id,
                        "Records unavailable: {}",
                        e
                    );
                    bundle.degraded.push("records".to_string());
                }
            }
        }

        if wants_similar_days(intent) {
            match self.index.similar_days(query_text, self.similar_days_k).await {
                Ok(hits) => bundle.similar_days = hits,
                Err(e) => {
                    warn!(
                        subsystem = "engine",
                        op = "retrieve",
                        session_id = %session_id,
                        "Similar-day search unavailable: {}",
                        e
                    );
                    bundle.degraded.push("similar_days".to_string());
                }
            }
        }

        match self.turns.recent_turns(session_id, self.history_turns).await {
            Ok(history) => bundle.history = history,
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    op = "retrieve",
                    session_id = %session_id,
                    "History unavailable: {}",
                    e
                );
                bundle.degraded.push("history".to_string());
            }
        }

        debug!(
            subsystem = "engine",
            op = "retrieve",
            session_id = %session_id,
            result_count = bundle.records.len(),
            similar = bundle.similar_days.len(),
            degraded = bundle.degraded.len(),
            "Context bundle assembled"
        );

        bundle
    }
}

/// Intents whose prompts benefit from semantically similar historical days.
fn wants_similar_days(intent: Intent) -> bool {
    matches!(
        intent,
        Intent::Explanation | Intent::Scenario | Intent::Recommendation
    )
}
