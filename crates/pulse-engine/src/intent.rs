//! Intent classification for user queries.
//!
//! Classification is a pure function over the query text and an explicit
//! reference date. It never performs I/O and never fails: a query that
//! matches no rule degrades to the GENERAL intent rather than erroring.
//!
//! Rules live in an ordered table of (intent, patterns) pairs evaluated in
//! sequence; the first matching group wins. Editing the table is the whole
//! job of tuning the classifier.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use pulse_core::{
    defaults, resolve_date_scope, temporal, DateScope, Intent, PrivacySensitivity,
    QueryComplexity, RouteMetadata,
};

/// Result of classifying one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
    pub date_scope: Option<DateScope>,
    pub route: RouteMetadata,
}

struct IntentRule {
    intent: Intent,
    patterns: Vec<Regex>,
}

fn rule(intent: Intent, patterns: &[&str]) -> IntentRule {
    IntentRule {
        intent,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).expect("valid intent pattern"))
            .collect(),
    }
}

/// Ordered rule table; earlier groups take precedence over later ones and
/// everything takes precedence over the GENERAL catch-all.
static RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
    vec![
        rule(
            Intent::Scenario,
            &[
                r"what if",
                r"if i (slept|sleep|exercised|exercise|walked|walk|raised|raise|improved|improve)",
                r"hypothetically",
                r"\bscenario\b",
            ],
        ),
        rule(
            Intent::Prediction,
            &[r"what will", r"\bpredict\b", r"\bforecast\b", r"\bexpect\b"],
        ),
        rule(
            Intent::Explanation,
            &[r"why (was|is|did|does|do)", r"what caused", r"\bexplain\b", r"reason for"],
        ),
        rule(
            Intent::Recommendation,
            &[
                r"how (can|do|should) i",
                r"\brecommend\b",
                r"\bsuggest\b",
                r"tips for",
                r"\badvice\b",
            ],
        ),
        rule(
            Intent::Comparison,
            &[r"\bcompare\b", r"\bvs\b", r"\bversus\b", r"difference between"],
        ),
        rule(
            Intent::Trend,
            &[
                r"\btrend\b",
                r"\btrending\b",
                r"over (time|the past|the last)",
                r"\bchanged\b",
                r"\bprogress\b",
            ],
        ),
        rule(
            Intent::DataLookup,
            &[
                r"what was my (bp|blood pressure|sleep|steps|heart rate|hrv|vo2)",
                r"show me my",
                r"my (bp|blood pressure) on",
                r"how much did i (sleep|walk)",
                r"how many steps",
                r"(sleep|steps|bp|heart rate) data",
            ],
        ),
    ]
});

static SENSITIVE_TERMS: &[&str] = &["medication", "drug", "mental", "anxiety", "depression"];

static STRUCTURED_OUTPUT_TERMS: &[&str] = &["code", "script", "json"];

/// Classify a query against the reference date `today`.
///
/// Deterministic: two calls with the same inputs yield the same result.
pub fn classify(text: &str, today: NaiveDate) -> Classification {
    let lower = text.to_lowercase();

    let (intent, confidence) = RULES
        .iter()
        .find(|r| r.patterns.iter().any(|p| p.is_match(&lower)))
        .map(|r| (r.intent, defaults::CONFIDENCE_MATCHED))
        .unwrap_or((Intent::General, defaults::CONFIDENCE_GENERAL));

    let mut date_scope = resolve_date_scope(&lower, today);

    // Guarantee a bounded window for the intents that always read records.
    if date_scope.is_none() {
        date_scope = match intent {
            Intent::DataLookup | Intent::Explanation => {
                Some(DateScope::single(temporal::yesterday(today)))
            }
            Intent::Trend => Some(temporal::last_n_days(
                today,
                defaults::TREND_WINDOW_DAYS as u64,
            )),
            _ => None,
        };
    }

    let privacy = if SENSITIVE_TERMS.iter().any(|t| lower.contains(t)) {
        PrivacySensitivity::Sensitive
    } else {
        PrivacySensitivity::Normal
    };

    let requires_structured_output = STRUCTURED_OUTPUT_TERMS.iter().any(|t| lower.contains(t));

    let complexity = complexity_for(intent, date_scope.as_ref());

    debug!(
        subsystem = "engine",
        op = "classify",
        intent = %intent,
        complexity = ?complexity,
        "Query classified"
    );

    Classification {
        intent,
        confidence,
        date_scope,
        route: RouteMetadata {
            complexity,
            privacy,
            requires_structured_output,
        },
    }
}

fn complexity_for(intent: Intent, date_scope: Option<&DateScope>) -> QueryComplexity {
    match intent {
        Intent::DataLookup => {
            if date_scope.map(|s| s.is_single()).unwrap_or(false) {
                QueryComplexity::Low
            } else {
                QueryComplexity::Medium
            }
        }
        Intent::Trend | Intent::Comparison | Intent::Recommendation => QueryComplexity::Medium,
        Intent::Explanation | Intent::Scenario | Intent::Prediction => QueryComplexity::High,
        Intent::General => QueryComplexity::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        d("2026-01-14")
    }

    #[test]
    fn data_lookup_with_explicit_date() {
        let c = classify("What was my BP on 2026-01-05?", today());
        assert_eq!(c.intent, Intent::DataLookup);
        assert_eq!(c.date_scope, Some(DateScope::single(d("2026-01-05"))));
        assert_eq!(c.route.complexity, QueryComplexity::Low);
        assert_eq!(c.route.privacy, PrivacySensitivity::Normal);
        assert_eq!(c.confidence, defaults::CONFIDENCE_MATCHED);
    }

    #[test]
    fn data_lookup_defaults_to_yesterday() {
        let c = classify("show me my sleep", today());
        assert_eq!(c.intent, Intent::DataLookup);
        assert_eq!(c.date_scope, Some(DateScope::single(d("2026-01-13"))));
        assert_eq!(c.route.complexity, QueryComplexity::Low);
    }

    #[test]
    fn explanation_defaults_to_yesterday() {
        let c = classify("why was my bp high", today());
        assert_eq!(c.intent, Intent::Explanation);
        assert_eq!(c.date_scope, Some(DateScope::single(d("2026-01-13"))));
        assert_eq!(c.route.complexity, QueryComplexity::High);
    }

    #[test]
    fn trend_defaults_to_last_seven_days() {
        let c = classify("what's the trend in my sleep", today());
        assert_eq!(c.intent, Intent::Trend);
        assert_eq!(
            c.date_scope,
            Some(DateScope::range(d("2026-01-07"), d("2026-01-14")))
        );
        assert_eq!(c.route.complexity, QueryComplexity::Medium);
    }

    #[test]
    fn scenario_wins_over_other_groups() {
        let c = classify("what if I sleep 8 hours every night", today());
        assert_eq!(c.intent, Intent::Scenario);
        assert_eq!(c.route.complexity, QueryComplexity::High);
    }

    #[test]
    fn prediction_intent() {
        let c = classify("what will my bp be tomorrow", today());
        assert_eq!(c.intent, Intent::Prediction);
        assert_eq!(c.route.complexity, QueryComplexity::High);
    }

    #[test]
    fn recommendation_intent() {
        let c = classify("how can i lower my blood pressure", today());
        assert_eq!(c.intent, Intent::Recommendation);
        assert_eq!(c.route.complexity, QueryComplexity::Medium);
    }

    #[test]
    fn comparison_intent() {
        let c = classify("compare my weekday vs weekend bp", today());
        assert_eq!(c.intent, Intent::Comparison);
        assert_eq!(c.route.complexity, QueryComplexity::Medium);
    }

    #[test]
    fn unmatched_query_degrades_to_general() {
        let c = classify("tell me something interesting", today());
        assert_eq!(c.intent, Intent::General);
        assert_eq!(c.confidence, defaults::CONFIDENCE_GENERAL);
        assert_eq!(c.route.complexity, QueryComplexity::Low);
        assert!(c.date_scope.is_none());
    }

    #[test]
    fn empty_query_never_panics() {
        let c = classify("", today());
        assert_eq!(c.intent, Intent::General);
    }

    #[test]
    fn medication_marks_sensitive_regardless_of_intent() {
        let c = classify("why does my medication affect my bp", today());
        assert_eq!(c.route.privacy, PrivacySensitivity::Sensitive);
        assert_eq!(c.route.complexity, QueryComplexity::High);

        let c = classify("show me my medication schedule", today());
        assert_eq!(c.route.privacy, PrivacySensitivity::Sensitive);
    }

    #[test]
    fn mental_health_vocabulary_marks_sensitive() {
        for term in ["anxiety", "depression", "mental health"] {
            let c = classify(&format!("how does {} affect sleep", term), today());
            assert_eq!(c.route.privacy, PrivacySensitivity::Sensitive, "{}", term);
        }
    }

    #[test]
    fn code_request_requires_structured_output() {
        let c = classify("write a script to chart my steps", today());
        assert!(c.route.requires_structured_output);

        let c = classify("what was my bp yesterday", today());
        assert!(!c.route.requires_structured_output);
    }

    #[test]
    fn classification_is_idempotent() {
        let a = classify("why was my bp high last tuesday", today());
        let b = classify("why was my bp high last tuesday", today());
        assert_eq!(a, b);
    }
}
