//! Centralized default constants for the pulsecoach system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// CONTEXT RETRIEVAL
// =============================================================================

/// Default number of similar historical days retrieved per query.
pub const SIMILAR_DAYS_K: i64 = 3;

/// Upper bound on similar-day retrieval (callers may raise k up to this).
pub const SIMILAR_DAYS_K_MAX: i64 = 5;

/// Conversation turns included in a context bundle, oldest-first.
pub const HISTORY_TURNS: i64 = 10;

/// Rolling window for baseline metric averages, in days.
pub const BASELINE_WINDOW_DAYS: i64 = 90;

/// Default date window for TREND queries with no resolvable date phrase.
pub const TREND_WINDOW_DAYS: i64 = 7;

/// Date window used for COMPARISON context (weekday vs. weekend splits).
pub const COMPARISON_WINDOW_DAYS: i64 = 30;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL (local backend).
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default local generation model (Ollama).
pub const LOCAL_GEN_MODEL: &str = "llama3.1:8b";

/// Default embedding model (Ollama).
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension for nomic-embed-text.
pub const EMBED_DIMENSION: usize = 768;

/// Default OpenAI base URL (validation backend).
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default validation model.
pub const VALIDATION_MODEL: &str = "gpt-4-turbo";

/// Default Anthropic base URL (reasoning backend).
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";

/// Default reasoning model.
pub const REASONING_MODEL: &str = "claude-sonnet-4-20250514";

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Timeout for backend availability probes in seconds.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Maximum tokens requested per completion.
pub const MAX_COMPLETION_TOKENS: u32 = 2048;

// =============================================================================
// COST ACCOUNTING
// =============================================================================

/// Coarse cost estimate for the reasoning backend, USD per token.
pub const REASONING_COST_PER_TOKEN: f64 = 0.000_015;

/// Coarse cost estimate for the validation backend, USD per token.
pub const VALIDATION_COST_PER_TOKEN: f64 = 0.000_03;

/// The local backend is free.
pub const LOCAL_COST_PER_TOKEN: f64 = 0.0;

// =============================================================================
// SCENARIO ENGINE
// =============================================================================

/// Default Monte Carlo trial count for confidence intervals.
pub const SCENARIO_TRIALS: usize = 1_000;

/// Default diastolic delta as a fraction of the systolic delta.
///
/// The source analyses disagree on whether this is a fixed 50% or a
/// per-user pulse-pressure ratio, so it is a `ScenarioConfig` knob.
pub const DIASTOLIC_RATIO: f64 = 0.5;

/// Systolic effect of VO2 max, mmHg per point.
pub const VO2_COEFF: f64 = -1.96;

/// Empirical standard error of [`VO2_COEFF`].
pub const VO2_COEFF_SE: f64 = 0.50;

/// Systolic effect of sleep, mmHg per hour.
pub const SLEEP_COEFF: f64 = -3.1;

/// Empirical standard error of [`SLEEP_COEFF`].
pub const SLEEP_COEFF_SE: f64 = 0.90;

/// Systolic effect of daily steps, mmHg per step.
pub const STEPS_COEFF: f64 = -0.0003;

/// Empirical standard error of [`STEPS_COEFF`].
pub const STEPS_COEFF_SE: f64 = 0.0001;

/// Feasible VO2 max improvement, points per month of consistent training.
pub const VO2_MONTHLY_RATE: f64 = 1.0;

/// Feasible sleep duration change, hours per month.
pub const SLEEP_MONTHLY_RATE: f64 = 2.0;

/// Feasible daily-step increase, steps per month.
pub const STEPS_MONTHLY_RATE: f64 = 6_000.0;

/// Days before a VO2 max change shows in blood pressure.
pub const VO2_LAG_DAYS: f64 = 14.0;

/// Days before a sleep change shows in blood pressure.
pub const SLEEP_LAG_DAYS: f64 = 3.0;

/// Days before a step-count change shows in blood pressure.
pub const STEPS_LAG_DAYS: f64 = 7.0;

/// Ramp to full VO2 effect, days per point of delta.
pub const VO2_RAMP_DAYS_PER_UNIT: f64 = 30.0;

/// Ramp to full sleep effect, days per hour of delta.
pub const SLEEP_RAMP_DAYS_PER_UNIT: f64 = 7.0;

/// Ramp to full steps effect, days per step of delta.
pub const STEPS_RAMP_DAYS_PER_UNIT: f64 = 0.0035;

/// Months-to-achieve boundary for a High feasibility tier.
pub const FEASIBILITY_HIGH_MONTHS: f64 = 1.0;

/// Months-to-achieve boundary for a Moderate feasibility tier.
pub const FEASIBILITY_MODERATE_MONTHS: f64 = 3.0;

/// Months-to-achieve boundary for a Low feasibility tier; beyond this the
/// scenario is flagged infeasible (never silently clipped).
pub const FEASIBILITY_LOW_MONTHS: f64 = 6.0;

// =============================================================================
// CLASSIFICATION & POST-PROCESSING
// =============================================================================

/// Confidence assigned when an intent rule matches.
pub const CONFIDENCE_MATCHED: f64 = 0.85;

/// Confidence assigned to the GENERAL catch-all.
pub const CONFIDENCE_GENERAL: f64 = 0.5;

/// Confidence penalty per unsupported citation in a reply.
pub const UNSUPPORTED_CITATION_PENALTY: f64 = 0.15;

/// Floor below which post-processing never pushes confidence.
pub const CONFIDENCE_FLOOR: f64 = 0.2;

// =============================================================================
// HEALTH CATEGORIES
// =============================================================================

/// Systolic boundary below which BP is "normal" (mmHg).
pub const BP_NORMAL_MAX: f64 = 120.0;

/// Systolic boundary below which BP is "elevated" (mmHg).
pub const BP_ELEVATED_MAX: f64 = 130.0;

/// Systolic boundary below which BP is "stage 1 hypertension" (mmHg).
pub const BP_STAGE1_MAX: f64 = 140.0;

/// Sleep hours for "good" sleep quality.
pub const SLEEP_GOOD_HOURS: f64 = 7.0;

/// Sleep hours for "fair" sleep quality.
pub const SLEEP_FAIR_HOURS: f64 = 6.0;

/// Steps for an "active" day.
pub const STEPS_ACTIVE: f64 = 10_000.0;

/// Steps for a "moderate" day.
pub const STEPS_MODERATE: f64 = 5_000.0;

// =============================================================================
// ALERT SCAN
// =============================================================================

/// Standard deviations above baseline that count as a BP spike.
pub const BP_SPIKE_SD: f64 = 2.0;

/// Consecutive short-sleep days that trigger a warning.
pub const SHORT_SLEEP_STREAK: usize = 3;

/// Consecutive step-goal days that trigger a celebration.
pub const STEP_GOAL_STREAK: usize = 7;

/// Date window scanned for alerts, in days.
pub const ALERT_WINDOW_DAYS: i64 = 14;
