//! Core data models for pulsecoach.
//!
//! These types are shared across all pulsecoach crates and represent the
//! core domain entities: the health record, the classified query, the
//! evidence bundle, conversation state, and scenario predictions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// QUERY & CLASSIFICATION TYPES
// =============================================================================

/// Immutable user query input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub session_id: String,
    pub submitted_at: DateTime<Utc>,
}

impl Query {
    /// Create a query stamped with the current time.
    pub fn new(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Classified purpose of a user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    DataLookup,
    Explanation,
    Prediction,
    Scenario,
    Recommendation,
    Trend,
    Comparison,
    General,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DataLookup => "data_lookup",
            Self::Explanation => "explanation",
            Self::Prediction => "prediction",
            Self::Scenario => "scenario",
            Self::Recommendation => "recommendation",
            Self::Trend => "trend",
            Self::Comparison => "comparison",
            Self::General => "general",
        };
        write!(f, "{}", s)
    }
}

impl Intent {
    /// Parse an intent from its persisted snake_case name.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "data_lookup" => Some(Self::DataLookup),
            "explanation" => Some(Self::Explanation),
            "prediction" => Some(Self::Prediction),
            "scenario" => Some(Self::Scenario),
            "recommendation" => Some(Self::Recommendation),
            "trend" => Some(Self::Trend),
            "comparison" => Some(Self::Comparison),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// Resolved absolute date or inclusive date range a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DateScope {
    Single { date: NaiveDate },
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateScope {
    pub fn single(date: NaiveDate) -> Self {
        Self::Single { date }
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self::Range { start, end }
    }

    /// Inclusive (start, end) bounds of the scope.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            Self::Single { date } => (date, date),
            Self::Range { start, end } => (start, end),
        }
    }

    /// True when the scope resolves to exactly one calendar date.
    pub fn is_single(&self) -> bool {
        let (start, end) = self.bounds();
        start == end
    }
}

/// Query complexity bucket used for backend routing. Never persisted with
/// query content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryComplexity {
    Low,
    Medium,
    High,
}

/// Privacy sensitivity of a query. Never persisted with query content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacySensitivity {
    Normal,
    Sensitive,
}

// =============================================================================
// HEALTH RECORD TYPES
// =============================================================================

/// One day of imported health metrics. Primary key is the date; all metrics
/// are sparse. Immutable once written by the import pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyHealthRecord {
    pub date: NaiveDate,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub heart_rate: Option<f64>,
    pub steps: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub sleep_efficiency_pct: Option<f64>,
    pub vo2_max: Option<f64>,
    pub hrv: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub active_calories: Option<f64>,
    pub exercise_minutes: Option<f64>,
}

/// Direction in which a metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalDirection {
    LowerIsBetter,
    HigherIsBetter,
}

/// A per-metric goal with its improvement direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricGoal {
    pub target: f64,
    pub direction: GoalDirection,
}

impl MetricGoal {
    pub fn lower(target: f64) -> Self {
        Self {
            target,
            direction: GoalDirection::LowerIsBetter,
        }
    }

    pub fn higher(target: f64) -> Self {
        Self {
            target,
            direction: GoalDirection::HigherIsBetter,
        }
    }

    /// True when `value` meets or beats the goal in its direction.
    pub fn is_met(&self, value: f64) -> bool {
        match self.direction {
            GoalDirection::LowerIsBetter => value <= self.target,
            GoalDirection::HigherIsBetter => value >= self.target,
        }
    }
}

/// Singleton user profile: display name, baseline averages, and goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub bp_goal: MetricGoal,
    pub sleep_goal: MetricGoal,
    pub steps_goal: MetricGoal,
    pub vo2_max_goal: MetricGoal,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "the user".to_string(),
            bp_goal: MetricGoal::lower(130.0),
            sleep_goal: MetricGoal::higher(7.0),
            steps_goal: MetricGoal::higher(10_000.0),
            vo2_max_goal: MetricGoal::higher(43.0),
        }
    }
}

/// Rolling baseline averages over the configured window (sparse, like the
/// records they are derived from).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    pub avg_systolic: Option<f64>,
    pub avg_diastolic: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub avg_steps: Option<f64>,
    pub avg_vo2_max: Option<f64>,
    pub avg_hrv: Option<f64>,
    pub systolic_stddev: Option<f64>,
}

// =============================================================================
// CONTEXT BUNDLE
// =============================================================================

/// A historical day surfaced by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarDay {
    pub date: NaiveDate,
    /// Cosine similarity in [0, 1]; callers down-weight weak matches.
    pub score: f32,
    pub summary: String,
}

/// Per-query ephemeral evidence aggregate. Built fresh per query; never
/// cached across sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBundle {
    pub profile: Option<UserProfile>,
    pub baselines: Option<Baselines>,
    /// Date-scoped records; missing dates are simply absent (no zero-fill).
    pub records: Vec<DailyHealthRecord>,
    pub similar_days: Vec<SimilarDay>,
    /// Last n turns for the session, oldest-first.
    pub history: Vec<ConversationTurn>,
    /// Store fields that could not be populated (degraded, not fatal).
    pub degraded: Vec<String>,
}

impl ContextBundle {
    /// True when at least one store failed during assembly.
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

// =============================================================================
// CONVERSATION TYPES
// =============================================================================

/// Terminal status of a handled query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "reason")]
pub enum TurnStatus {
    Delivered,
    Failed(String),
}

impl TurnStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// One completed (or failed) query/response exchange, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub session_id: String,
    pub query_text: String,
    pub intent: Intent,
    pub backend: Option<BackendId>,
    pub response_text: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost_usd: f64,
    pub status: TurnStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ROUTING TYPES
// =============================================================================

/// One of the interchangeable text-completion services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// Remote frontier model for high-complexity reasoning.
    Reasoning,
    /// Remote model for structured output and mid-tier queries.
    Validation,
    /// Local model; the only backend sensitive queries may reach.
    Local,
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reasoning => write!(f, "reasoning"),
            Self::Validation => write!(f, "validation"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl BackendId {
    /// Parse a backend id from its persisted lowercase name.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reasoning" => Some(Self::Reasoning),
            "validation" => Some(Self::Validation),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Routing signals derived per query. Never persisted with query content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMetadata {
    pub complexity: QueryComplexity,
    pub privacy: PrivacySensitivity,
    pub requires_structured_output: bool,
}

/// A completion produced by a backend, with token accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

impl Completion {
    pub fn total_tokens(&self) -> i64 {
        self.input_tokens + self.output_tokens
    }
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// A date or metric figure the reply cited, with its verification status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub claim: String,
    pub supported: bool,
}

/// Final formatted answer handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachReply {
    pub text: String,
    pub intent: Intent,
    pub confidence: f64,
    pub citations: Vec<Citation>,
    pub backend: Option<BackendId>,
    pub status: TurnStatus,
}

// =============================================================================
// SCENARIO TYPES
// =============================================================================

/// A lifestyle factor with a modeled linear effect on systolic BP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactFactor {
    Vo2Max,
    SleepHours,
    Steps,
}

impl std::fmt::Display for ImpactFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vo2Max => write!(f, "VO2 max"),
            Self::SleepHours => write!(f, "sleep hours"),
            Self::Steps => write!(f, "steps"),
        }
    }
}

/// Baseline metric values + proposed deltas for a what-if prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub baseline_systolic: f64,
    pub vo2_delta: f64,
    pub sleep_delta: f64,
    pub steps_delta: f64,
}

impl ScenarioRequest {
    /// Deltas as (factor, value) pairs, zero deltas included.
    pub fn deltas(&self) -> [(ImpactFactor, f64); 3] {
        [
            (ImpactFactor::Vo2Max, self.vo2_delta),
            (ImpactFactor::SleepHours, self.sleep_delta),
            (ImpactFactor::Steps, self.steps_delta),
        ]
    }

    /// Number of factors actually being changed.
    pub fn active_factors(&self) -> usize {
        self.deltas().iter().filter(|(_, d)| *d != 0.0).count()
    }
}

/// Qualitative rating of how realistic a proposed change is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeasibilityTier {
    High,
    Moderate,
    Low,
    Infeasible,
}

impl std::fmt::Display for FeasibilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Moderate => write!(f, "moderate"),
            Self::Low => write!(f, "low"),
            Self::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Counterfactual BP prediction for a scenario request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Point estimate of the systolic change, mmHg.
    pub systolic_delta: f64,
    /// Diastolic change, derived via the configured pulse-pressure ratio.
    pub diastolic_delta: f64,
    /// Predicted systolic after the change.
    pub predicted_systolic: f64,
    /// 2.5/97.5 percentile band of the systolic delta.
    pub confidence_interval: (f64, f64),
    pub feasibility: FeasibilityTier,
    /// Days until the full effect is expected (lag + ramp).
    pub timeline_days: f64,
}

// =============================================================================
// ALERT & JOB TYPES
// =============================================================================

/// Alert priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Critical,
    Warning,
    Info,
    Celebration,
}

impl std::fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
            Self::Celebration => write!(f, "celebration"),
        }
    }
}

/// A detected pattern, anomaly, or achievement in the health data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: String,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of one scheduled-job invocation, recorded for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub job_name: String,
    pub succeeded: bool,
    pub detail: String,
    pub ran_at: DateTime<Utc>,
}

impl JobRun {
    pub fn success(job_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            succeeded: true,
            detail: detail.into(),
            ran_at: Utc::now(),
        }
    }

    pub fn failure(job_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            succeeded: false,
            detail: detail.into(),
            ran_at: Utc::now(),
        }
    }
}
