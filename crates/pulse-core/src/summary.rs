//! Natural-language rendering of daily health records.
//!
//! The rendered summary is what gets embedded into the vector index and what
//! prompts quote when describing a day, so the wording here is the retrieval
//! contract: stable, compact, and category-annotated.

use crate::defaults;
use crate::models::DailyHealthRecord;

/// Clinical category for a systolic reading.
pub fn bp_category(systolic: f64) -> &'static str {
    if systolic < defaults::BP_NORMAL_MAX {
        "normal"
    } else if systolic < defaults::BP_ELEVATED_MAX {
        "elevated"
    } else if systolic < defaults::BP_STAGE1_MAX {
        "stage 1 hypertension"
    } else {
        "stage 2 hypertension"
    }
}

/// Qualitative sleep rating from hours slept.
pub fn sleep_quality(hours: f64) -> &'static str {
    if hours >= defaults::SLEEP_GOOD_HOURS {
        "good"
    } else if hours >= defaults::SLEEP_FAIR_HOURS {
        "fair"
    } else {
        "poor"
    }
}

/// Qualitative activity rating from step count.
pub fn activity_level(steps: f64) -> &'static str {
    if steps >= defaults::STEPS_ACTIVE {
        "active"
    } else if steps >= defaults::STEPS_MODERATE {
        "moderate"
    } else {
        "low"
    }
}

/// Format a systolic/diastolic pair, tolerating sparse halves.
pub fn format_bp(systolic: Option<f64>, diastolic: Option<f64>) -> String {
    match (systolic, diastolic) {
        (Some(s), Some(d)) => format!("{:.0}/{:.0}", s, d),
        (Some(s), None) => format!("{:.0}/--", s),
        _ => "N/A".to_string(),
    }
}

/// Render one record as the one-line summary used for embedding and prompts.
pub fn daily_summary(record: &DailyHealthRecord) -> String {
    let mut parts = vec![record.date.to_string()];

    match record.systolic {
        Some(s) => parts.push(format!(
            "BP {} mmHg ({})",
            format_bp(record.systolic, record.diastolic),
            bp_category(s)
        )),
        None => parts.push("BP not recorded".to_string()),
    }

    if let Some(hours) = record.sleep_hours {
        let eff = record
            .sleep_efficiency_pct
            .map(|e| format!(" ({:.0}% efficiency)", e))
            .unwrap_or_default();
        parts.push(format!(
            "Sleep {:.1}hrs{} - {}",
            hours,
            eff,
            sleep_quality(hours)
        ));
    }

    if let Some(steps) = record.steps {
        parts.push(format!(
            "Activity {:.0} steps - {}",
            steps,
            activity_level(steps)
        ));
    }

    if let Some(vo2) = record.vo2_max {
        parts.push(format!("VO2 max {:.1}", vo2));
    }

    if let Some(hrv) = record.hrv {
        parts.push(format!("HRV {:.0}ms", hrv));
    }

    parts.join(". ")
}
