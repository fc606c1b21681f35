//! Prompt assembly from a context bundle.
//!
//! Templates are fixed per intent; only the evidence sections vary. The
//! system prompt carries the coach persona plus the profile and baseline
//! summary, and the user prompt carries the evidence followed by the
//! question.

use pulse_core::{daily_summary, format_bp, ContextBundle, Intent};

/// A fully assembled prompt pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt for one query from its intent and context bundle.
pub fn build_prompt(intent: Intent, bundle: &ContextBundle, question: &str) -> Prompt {
    Prompt {
        system: system_prompt(bundle),
        user: user_prompt(intent, bundle, question),
    }
}

fn system_prompt(bundle: &ContextBundle) -> String {
    let mut out = String::from(
        "You are a personal health coach working from the user's own recorded data. \
         Ground every claim in the data provided; when the data does not cover a \
         question, say so plainly. You do not diagnose conditions or adjust \
         medication. Keep answers concise and specific.",
    );

    if let Some(profile) = &bundle.profile {
        out.push_str(&format!(
            "\n\nUser: {}. Goals: systolic BP {} {:.0} mmHg, sleep {} {:.1} hrs, \
             steps {} {:.0}, VO2 max {} {:.1}.",
            profile.name,
            goal_word(profile.bp_goal.direction),
            profile.bp_goal.target,
            goal_word(profile.sleep_goal.direction),
            profile.sleep_goal.target,
            goal_word(profile.steps_goal.direction),
            profile.steps_goal.target,
            goal_word(profile.vo2_max_goal.direction),
            profile.vo2_max_goal.target,
        ));
    }

    if let Some(b) = &bundle.baselines {
        let mut parts = Vec::new();
        if b.avg_systolic.is_some() || b.avg_diastolic.is_some() {
            parts.push(format!(
                "BP {} mmHg",
                format_bp(b.avg_systolic, b.avg_diastolic)
            ));
        }
        if let Some(v) = b.avg_sleep_hours {
            parts.push(format!("sleep {:.1} hrs", v));
        }
        if let Some(v) = b.avg_steps {
            parts.push(format!("{:.0} steps", v));
        }
        if let Some(v) = b.avg_vo2_max {
            parts.push(format!("VO2 max {:.1}", v));
        }
        if !parts.is_empty() {
            out.push_str(&format!("\n90-day baselines: {}.", parts.join(", ")));
        }
    }

    out
}

fn goal_word(direction: pulse_core::GoalDirection) -> &'static str {
    match direction {
        pulse_core::GoalDirection::LowerIsBetter => "under",
        pulse_core::GoalDirection::HigherIsBetter => "at least",
    }
}

fn user_prompt(intent: Intent, bundle: &ContextBundle, question: &str) -> String {
    let mut sections = Vec::new();

    if !bundle.records.is_empty() {
        let lines: Vec<String> = bundle.records.iter().map(daily_summary).collect();
        sections.push(format!("Recorded data:\n{}", lines.join("\n")));
    }

    if !bundle.similar_days.is_empty() {
        let lines: Vec<String> = bundle
            .similar_days
            .iter()
            .map(|day| format!("- ({:.2}) {}", day.score, day.summary))
            .collect();
        sections.push(format!("Similar past days:\n{}", lines.join("\n")));
    }

    if !bundle.history.is_empty() {
        let lines: Vec<String> = bundle
            .history
            .iter()
            .map(|turn| format!("User: {}\nCoach: {}", turn.query_text, turn.response_text))
            .collect();
        sections.push(format!("Recent conversation:\n{}", lines.join("\n")));
    }

    sections.push(instruction_for(intent).to_string());
    sections.push(format!("Question: {}", question));

    sections.join("\n\n")
}

/// Per-intent answer shaping instruction.
fn instruction_for(intent: Intent) -> &'static str {
    match intent {
        Intent::DataLookup => {
            "Answer with the exact recorded figures for the requested date(s). \
             If a metric was not recorded, say so rather than estimating."
        }
        Intent::Explanation => {
            "Rank the most likely contributing factors from the data, strongest \
             first, and say which evidence supports each."
        }
        Intent::Prediction => {
            "Give a cautious short-term projection from the recent data and name \
             the main sources of uncertainty."
        }
        Intent::Scenario => {
            "Explain the projected effect of the proposed change, including the \
             confidence band and how long the effect takes to appear."
        }
        Intent::Recommendation => {
            "Give 1-3 prioritized, concrete actions tied to the user's goals and \
             recent data."
        }
        Intent::Trend => {
            "Describe the direction and size of the change over the window, \
             citing start and end values."
        }
        Intent::Comparison => {
            "Compare the two groups with their averages and note whether the \
             difference looks meaningful."
        }
        Intent::General => "Answer briefly, using the user's data where relevant.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_core::{Baselines, DailyHealthRecord, SimilarDay, UserProfile};

    fn bundle() -> ContextBundle {
        ContextBundle {
            profile: Some(UserProfile::default()),
            baselines: Some(Baselines {
                avg_systolic: Some(134.2),
                avg_diastolic: Some(86.0),
                avg_sleep_hours: Some(7.1),
                avg_steps: Some(8_450.0),
                ..Default::default()
            }),
            records: vec![DailyHealthRecord {
                date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                systolic: Some(138.5),
                diastolic: Some(88.0),
                ..Default::default()
            }],
            similar_days: vec![SimilarDay {
                date: NaiveDate::from_ymd_opt(2025, 12, 20).unwrap(),
                score: 0.91,
                summary: "2025-12-20. BP 137/87 mmHg (stage 1 hypertension)".to_string(),
            }],
            history: vec![],
            degraded: vec![],
        }
    }

    #[test]
    fn system_prompt_includes_profile_and_baselines() {
        let p = build_prompt(Intent::DataLookup, &bundle(), "what was my bp");
        assert!(p.system.contains("health coach"));
        assert!(p.system.contains("130"));
        assert!(p.system.contains("134/86 mmHg"));
    }

    #[test]
    fn user_prompt_carries_records_and_similar_days() {
        let p = build_prompt(Intent::Explanation, &bundle(), "why was my bp high");
        assert!(p.user.contains("2026-01-05"));
        assert!(p.user.contains("139/88"));
        assert!(p.user.contains("(0.91)"));
        assert!(p.user.ends_with("Question: why was my bp high"));
    }

    #[test]
    fn templates_differ_by_intent() {
        let b = bundle();
        let explain = build_prompt(Intent::Explanation, &b, "q");
        let recommend = build_prompt(Intent::Recommendation, &b, "q");
        assert_ne!(explain.user, recommend.user);
        assert!(explain.user.contains("contributing factors"));
        assert!(recommend.user.contains("prioritized"));
    }

    #[test]
    fn empty_bundle_still_produces_prompt() {
        let p = build_prompt(Intent::General, &ContextBundle::default(), "hello");
        assert!(!p.system.is_empty());
        assert!(p.user.contains("Question: hello"));
    }
}
