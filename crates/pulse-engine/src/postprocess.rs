//! Reply post-processing: the factuality gate.
//!
//! Extracts dates and blood-pressure figures the backend cited and checks
//! each against the context bundle the prompt was built from. Unsupported
//! claims lower the confidence score but are never hidden from the user;
//! the citations travel with the reply so a UI can flag them.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use pulse_core::{defaults, Citation, ContextBundle};

static CITED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid regex"));

static CITED_BP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{2,3}(?:\.\d+)?)(?:\s*/\s*(\d{2,3}(?:\.\d+)?))?\s*mmHg")
        .expect("valid regex")
});

/// Tolerance when matching a cited figure against a recorded value, wide
/// enough to absorb rounding in the reply text.
const FIGURE_TOLERANCE: f64 = 0.75;

/// Outcome of post-processing one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessed {
    pub confidence: f64,
    pub citations: Vec<Citation>,
}

/// Cross-check the reply's cited dates and BP figures against the bundle.
///
/// Starting from `base_confidence`, each unsupported citation subtracts a
/// fixed penalty, floored so the score never reaches zero.
pub fn verify_reply(
    reply: &str,
    bundle: &ContextBundle,
    base_confidence: f64,
) -> PostProcessed {
    let mut citations = Vec::new();

    for caps in CITED_DATE.captures_iter(reply) {
        let claim = caps[1].to_string();
        let supported = NaiveDate::parse_from_str(&claim, "%Y-%m-%d")
            .map(|date| date_supported(date, bundle))
            .unwrap_or(false);
        trace!(
            subsystem = "engine",
            op = "verify",
            claim = %claim,
            supported,
            "Cited date checked"
        );
        citations.push(Citation { claim, supported });
    }

    for caps in CITED_BP.captures_iter(reply) {
        let claim = caps[0].trim().to_string();
        let systolic: Option<f64> = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let diastolic: Option<f64> = caps.get(2).and_then(|m| m.as_str().parse().ok());

        let supported = systolic
            .map(|s| figure_supported(s, diastolic, bundle))
            .unwrap_or(false);
        trace!(
            subsystem = "engine",
            op = "verify",
            claim = %claim,
            supported,
            "Cited figure checked"
        );
        citations.push(Citation { claim, supported });
    }

    let unsupported = citations.iter().filter(|c| !c.supported).count();
    let confidence = (base_confidence
        - unsupported as f64 * defaults::UNSUPPORTED_CITATION_PENALTY)
        .max(defaults::CONFIDENCE_FLOOR);

    debug!(
        subsystem = "engine",
        op = "verify",
        result_count = citations.len(),
        unsupported,
        confidence,
        "Reply verified"
    );

    PostProcessed {
        confidence,
        citations,
    }
}

fn date_supported(date: NaiveDate, bundle: &ContextBundle) -> bool {
    bundle.records.iter().any(|r| r.date == date)
        || bundle.similar_days.iter().any(|d| d.date == date)
}

fn figure_supported(systolic: f64, diastolic: Option<f64>, bundle: &ContextBundle) -> bool {
    let close = |a: f64, b: f64| (a - b).abs() <= FIGURE_TOLERANCE;

    let matches_pair = |rec_sys: Option<f64>, rec_dia: Option<f64>| {
        let sys_ok = rec_sys.map(|v| close(systolic, v)).unwrap_or(false);
        match diastolic {
            Some(d) => sys_ok && rec_dia.map(|v| close(d, v)).unwrap_or(false),
            None => sys_ok,
        }
    };

    bundle
        .records
        .iter()
        .any(|r| matches_pair(r.systolic, r.diastolic))
        || bundle
            .baselines
            .as_ref()
            .map(|b| matches_pair(b.avg_systolic, b.avg_diastolic))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Baselines, DailyHealthRecord};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bundle() -> ContextBundle {
        ContextBundle {
            records: vec![DailyHealthRecord {
                date: d("2026-01-05"),
                systolic: Some(138.5),
                diastolic: Some(88.0),
                ..Default::default()
            }],
            baselines: Some(Baselines {
                avg_systolic: Some(134.0),
                avg_diastolic: Some(86.0),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn supported_date_and_figure_keep_confidence() {
        let reply = "On 2026-01-05 your BP was 138.5/88 mmHg, slightly above your baseline.";
        let result = verify_reply(reply, &bundle(), defaults::CONFIDENCE_MATCHED);

        assert_eq!(result.confidence, defaults::CONFIDENCE_MATCHED);
        assert!(result.citations.iter().all(|c| c.supported));
        assert_eq!(result.citations.len(), 2);
    }

    #[test]
    fn rounded_figure_still_supported() {
        let reply = "Your reading was 139/88 mmHg.";
        let result = verify_reply(reply, &bundle(), defaults::CONFIDENCE_MATCHED);
        assert!(result.citations[0].supported);
    }

    #[test]
    fn unsupported_date_lowers_confidence() {
        let reply = "On 2026-01-09 your BP spiked.";
        let result = verify_reply(reply, &bundle(), defaults::CONFIDENCE_MATCHED);

        assert_eq!(result.citations.len(), 1);
        assert!(!result.citations[0].supported);
        assert_eq!(
            result.confidence,
            defaults::CONFIDENCE_MATCHED - defaults::UNSUPPORTED_CITATION_PENALTY
        );
    }

    #[test]
    fn unsupported_figure_lowers_confidence() {
        let reply = "Your BP was 155/95 mmHg.";
        let result = verify_reply(reply, &bundle(), defaults::CONFIDENCE_MATCHED);
        assert!(!result.citations[0].supported);
        assert!(result.confidence < defaults::CONFIDENCE_MATCHED);
    }

    #[test]
    fn confidence_never_drops_below_floor() {
        let reply =
            "On 2025-03-01 it was 150/90 mmHg, on 2025-03-02 it was 160/95 mmHg, \
             on 2025-03-03 it was 170/99 mmHg, and on 2025-03-04 it was 180/105 mmHg.";
        let result = verify_reply(reply, &bundle(), defaults::CONFIDENCE_MATCHED);
        assert_eq!(result.confidence, defaults::CONFIDENCE_FLOOR);
    }

    #[test]
    fn baseline_figures_count_as_supported() {
        let reply = "That is above your 134/86 mmHg baseline.";
        let result = verify_reply(reply, &bundle(), defaults::CONFIDENCE_MATCHED);
        assert!(result.citations[0].supported);
    }

    #[test]
    fn reply_without_citations_is_untouched() {
        let result = verify_reply("Sleep more, move more.", &bundle(), 0.85);
        assert!(result.citations.is_empty());
        assert_eq!(result.confidence, 0.85);
    }
}
