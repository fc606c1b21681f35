//! The coaching facade.
//!
//! Wires the retriever, router, backends, stores, and jobs into one handle
//! an embedding application talks to. Each entry point maps onto one
//! pipeline: a conversational query, the counterfactual model, or one of
//! the scheduled jobs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use pulse_core::{
    AlertStore, BackendId, CoachReply, CompletionBackend, DayEmbeddingIndex,
    HealthRecordStore, JobLogStore, ProfileStore, Query, Result, ScenarioRequest,
    ScenarioResult, TurnStore, defaults,
};
use pulse_inference::ModelRouter;

use crate::alerts::AlertScanner;
use crate::briefing::{Briefing, DailyBriefingGenerator};
use crate::context::ContextRetriever;
use crate::conversation::ConversationManager;
use crate::report::{WeeklyReport, WeeklyReportGenerator};
use crate::scenario::ScenarioEngine;

/// Everything the coach needs, bundled so construction stays one call.
pub struct CoachStores {
    pub records: Arc<dyn HealthRecordStore>,
    pub profile: Arc<dyn ProfileStore>,
    pub turns: Arc<dyn TurnStore>,
    pub index: Arc<dyn DayEmbeddingIndex>,
    pub alerts: Arc<dyn AlertStore>,
    pub jobs: Arc<dyn JobLogStore>,
}

/// Top-level handle over the whole coaching system.
pub struct HealthCoach {
    records: Arc<dyn HealthRecordStore>,
    profile: Arc<dyn ProfileStore>,
    conversation: ConversationManager,
    scenario: ScenarioEngine,
    briefing: DailyBriefingGenerator,
    report: WeeklyReportGenerator,
    alerts: AlertScanner,
}

impl HealthCoach {
    pub fn new(
        stores: CoachStores,
        backends: HashMap<BackendId, Arc<dyn CompletionBackend>>,
        router: ModelRouter,
    ) -> Self {
        let retriever = ContextRetriever::new(
            stores.records.clone(),
            stores.profile.clone(),
            stores.turns.clone(),
            stores.index.clone(),
        );
        let conversation =
            ConversationManager::new(retriever, router, backends, stores.turns.clone());
        let briefing = DailyBriefingGenerator::new(
            stores.records.clone(),
            stores.profile.clone(),
            stores.jobs.clone(),
        );
        let report = WeeklyReportGenerator::new(
            stores.records.clone(),
            stores.profile.clone(),
            stores.jobs.clone(),
        );
        let alerts = AlertScanner::new(
            stores.records.clone(),
            stores.profile.clone(),
            stores.alerts.clone(),
            stores.jobs.clone(),
        );

        Self {
            records: stores.records,
            profile: stores.profile,
            conversation,
            scenario: ScenarioEngine::new(),
            briefing,
            report,
            alerts,
        }
    }

    /// Answer one conversational query. Always returns a reply; failures
    /// surface in its status, never as an error.
    pub async fn answer_query(&self, text: &str, session_id: &str) -> CoachReply {
        let query = Query::new(text, session_id);
        self.conversation
            .handle(&query, Utc::now().date_naive())
            .await
    }

    /// Run the counterfactual model against the user's current baseline.
    ///
    /// The baseline systolic comes from the 90-day average, falling back to
    /// the profile's goal when no history exists yet.
    pub async fn run_scenario(
        &self,
        vo2_delta: f64,
        sleep_delta: f64,
        steps_delta: f64,
    ) -> Result<ScenarioResult> {
        let baselines = self
            .records
            .baselines(Utc::now().date_naive(), defaults::BASELINE_WINDOW_DAYS)
            .await?;
        let baseline_systolic = match baselines.avg_systolic {
            Some(avg) => avg,
            None => self.profile.get_profile().await?.bp_goal.target,
        };

        self.scenario.predict(&ScenarioRequest {
            baseline_systolic,
            vo2_delta,
            sleep_delta,
            steps_delta,
        })
    }

    /// Compose the morning briefing for `date`.
    pub async fn generate_briefing(&self, date: NaiveDate) -> Result<Briefing> {
        self.briefing.generate(date).await
    }

    /// Compose the report for the week ending on `week_end`.
    pub async fn generate_weekly_report(&self, week_end: NaiveDate) -> Result<WeeklyReport> {
        self.report.generate(week_end).await
    }

    /// Run the alert rules for `check_date` and persist whatever fires.
    pub async fn scan_alerts(&self, check_date: NaiveDate) -> Result<Vec<pulse_core::Alert>> {
        self.alerts.scan(check_date).await
    }
}
