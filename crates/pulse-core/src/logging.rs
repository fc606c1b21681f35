//! Structured logging schema and field name constants for pulsecoach.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, job completions |
//! | DEBUG | Decision points (routing, classification), intermediate values |
//! | TRACE | Per-item iteration (similar-day hits, citation checks) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "db", "inference", "index"
pub const SUBSYSTEM: &str = "subsystem";

/// Session the event belongs to.
pub const SESSION_ID: &str = "session_id";

/// Logical operation name.
/// Examples: "classify", "retrieve", "complete", "append_turn"
pub const OPERATION: &str = "op";

// ─── Query fields ──────────────────────────────────────────────────────────

/// Classified intent variant.
pub const INTENT: &str = "intent";

/// Backend serving (or selected for) a query.
pub const BACKEND: &str = "backend";

/// Query complexity bucket.
pub const COMPLEXITY: &str = "complexity";

/// Scheduled-job name ("daily_briefing", "weekly_report", "alert_scan").
pub const JOB_NAME: &str = "job";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records, hits, or turns returned.
pub const RESULT_COUNT: &str = "result_count";

/// Total tokens consumed by a completion.
pub const TOKENS: &str = "tokens";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Initialize the global tracing subscriber from `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn field_names_are_snake_case() {
        for name in [
            SUBSYSTEM,
            SESSION_ID,
            OPERATION,
            INTENT,
            BACKEND,
            COMPLEXITY,
            JOB_NAME,
            DURATION_MS,
            RESULT_COUNT,
            TOKENS,
            PROMPT_LEN,
        ] {
            assert!(!name.is_empty());
            assert_eq!(name, name.to_lowercase());
            assert!(!name.contains(' '));
        }
    }
}
