//! Morning briefing job.
//!
//! Composes a plain-text briefing from yesterday's record, the 90-day
//! baselines, and the profile goals. No model call is involved; the text
//! is assembled locally so the job runs even when every backend is down.
//! A missing yesterday record degrades to a baseline-only briefing rather
//! than failing the job.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{error, info, warn};

use pulse_core::{
    activity_level, bp_category, defaults, format_bp, sleep_quality, Baselines,
    DailyHealthRecord, HealthRecordStore, JobLogStore, JobRun, ProfileStore, Result,
    UserProfile,
};

const JOB_NAME: &str = "daily_briefing";

/// Width of the prediction band around the projected systolic value.
const PREDICTION_BAND: f64 = 5.0;

/// A composed briefing for one morning.
#[derive(Debug, Clone, PartialEq)]
pub struct Briefing {
    pub date: NaiveDate,
    pub text: String,
}

/// Generates the morning briefing and records the job run.
pub struct DailyBriefingGenerator {
    records: Arc<dyn HealthRecordStore>,
    profile: Arc<dyn ProfileStore>,
    jobs: Arc<dyn JobLogStore>,
}

impl DailyBriefingGenerator {
    pub fn new(
        records: Arc<dyn HealthRecordStore>,
        profile: Arc<dyn ProfileStore>,
        jobs: Arc<dyn JobLogStore>,
    ) -> Self {
        Self {
            records,
            profile,
            jobs,
        }
    }

    /// Compose the briefing for the morning of `today`.
    ///
    /// Only a store failure produces an `Err`; sparse or absent data does
    /// not. Either way the outcome lands in the job log.
    pub async fn generate(&self, today: NaiveDate) -> Result<Briefing> {
        match self.compose(today).await {
            Ok(briefing) => {
                self.log_run(JobRun::success(
                    JOB_NAME,
                    format!("briefing composed for {}", today),
                ))
                .await;
                info!(
                    subsystem = "jobs",
                    job = JOB_NAME,
                    date = %today,
                    "Briefing generated"
                );
                Ok(briefing)
            }
            Err(e) => {
                self.log_run(JobRun::failure(JOB_NAME, e.to_string())).await;
                error!(
                    subsystem = "jobs",
                    job = JOB_NAME,
                    date = %today,
                    "Briefing failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn compose(&self, today: NaiveDate) -> Result<Briefing> {
        let profile = match self.profile.get_profile().await {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    job = JOB_NAME,
                    "Profile unavailable, using defaults: {}",
                    e
                );
                UserProfile::default()
            }
        };

        let yesterday = today
            .checked_sub_days(Days::new(1))
            .unwrap_or(today);
        let record = self.records.get_record(yesterday).await?;
        let baselines = self
            .records
            .baselines(today, defaults::BASELINE_WINDOW_DAYS)
            .await?;

        let mut out = format!("MORNING BRIEFING: {}\n", today);

        match &record {
            Some(rec) => {
                out.push_str("\nYESTERDAY'S SUMMARY\n");
                out.push_str(&yesterday_section(rec));
            }
            None => {
                out.push_str(
                    "\nNo data recorded for yesterday. Today's outlook is based \
                     on your historical averages.\n",
                );
            }
        }

        out.push_str("\nTODAY'S PREDICTION\n");
        out.push_str(&prediction_section(record.as_ref(), &baselines, &profile));

        out.push_str("\nRECOMMENDATIONS\n");
        for (i, rec) in recommendations(record.as_ref(), &baselines, &profile)
            .iter()
            .enumerate()
        {
            out.push_str(&format!("{}. {}\n", i + 1, rec));
        }

        out.push('\n');
        out.push_str(&motivation(record.as_ref(), &baselines));
        out.push('\n');

        Ok(Briefing { date: today, text: out })
    }

    async fn log_run(&self, run: JobRun) {
        if let Err(e) = self.jobs.append_job_run(&run).await {
            error!(
                subsystem = "jobs",
                job = JOB_NAME,
                "Failed to record job run: {}",
                e
            );
        }
    }
}

fn yesterday_section(rec: &DailyHealthRecord) -> String {
    let mut out = String::new();

    match rec.systolic {
        Some(s) => out.push_str(&format!(
            "Blood Pressure: {} mmHg ({})\n",
            format_bp(rec.systolic, rec.diastolic),
            bp_category(s)
        )),
        None => out.push_str("Blood Pressure: not recorded\n"),
    }

    if let Some(hours) = rec.sleep_hours {
        out.push_str(&format!(
            "Sleep: {:.1} hours ({})\n",
            hours,
            sleep_quality(hours)
        ));
    }

    if let Some(steps) = rec.steps {
        out.push_str(&format!(
            "Activity: {:.0} steps ({})\n",
            steps,
            activity_level(steps)
        ));
    }

    if let Some(vo2) = rec.vo2_max {
        out.push_str(&format!("VO2 Max: {:.1} mL/kg/min\n", vo2));
    }

    out
}

/// Project today's systolic from the baseline average, nudged by how far
/// yesterday's sleep fell short of the goal. Uses the same per-hour effect
/// size as the counterfactual model, with the sign flipped for lost sleep.
fn prediction_section(
    record: Option<&DailyHealthRecord>,
    baselines: &Baselines,
    profile: &UserProfile,
) -> String {
    let Some(avg) = baselines.avg_systolic else {
        return "Not enough history yet to project today's blood pressure.\n".to_string();
    };

    let mut predicted = avg;
    if let Some(hours) = record.and_then(|r| r.sleep_hours) {
        let deficit = (profile.sleep_goal.target - hours).max(0.0);
        predicted += deficit * defaults::SLEEP_COEFF.abs();
    }

    format!(
        "Expected systolic: {:.0} mmHg (range {:.0}-{:.0})\n",
        predicted,
        predicted - PREDICTION_BAND,
        predicted + PREDICTION_BAND
    )
}

/// Up to three prioritized actions for the day. Sleep shortfall first, then
/// the step gap, then cardio for VO2 max; a clean slate earns a single
/// keep-it-up line.
fn recommendations(
    record: Option<&DailyHealthRecord>,
    baselines: &Baselines,
    profile: &UserProfile,
) -> Vec<String> {
    let mut recs = Vec::new();

    let sleep = record
        .and_then(|r| r.sleep_hours)
        .or(baselines.avg_sleep_hours);
    if let Some(hours) = sleep {
        if hours < profile.sleep_goal.target {
            recs.push(format!(
                "Prioritize sleep tonight: aim for {:.1}+ hours (you got {:.1}).",
                profile.sleep_goal.target, hours
            ));
        }
    }

    let steps = record.and_then(|r| r.steps).or(baselines.avg_steps);
    if let Some(count) = steps {
        if count < profile.steps_goal.target {
            recs.push(format!(
                "Add {:.0} steps today to reach your {:.0}-step goal.",
                profile.steps_goal.target - count,
                profile.steps_goal.target
            ));
        }
    }

    let vo2 = record.and_then(|r| r.vo2_max).or(baselines.avg_vo2_max);
    if let Some(v) = vo2 {
        if v < profile.vo2_max_goal.target {
            recs.push(
                "Fit in a cardio session; VO2 max is your strongest blood \
                 pressure lever."
                    .to_string(),
            );
        }
    }

    if recs.is_empty() {
        recs.push("Maintain your current healthy habits!".to_string());
    }

    recs.truncate(3);
    recs
}

fn motivation(record: Option<&DailyHealthRecord>, baselines: &Baselines) -> String {
    let (Some(yesterday), Some(avg)) = (
        record.and_then(|r| r.systolic),
        baselines.avg_systolic,
    ) else {
        return "Every day of data makes your coaching sharper. Keep logging!"
            .to_string();
    };

    if yesterday < avg - PREDICTION_BAND {
        format!(
            "Yesterday's reading beat your average by {:.0} mmHg. Whatever you \
             did, do it again.",
            avg - yesterday
        )
    } else if yesterday > avg + PREDICTION_BAND {
        format!(
            "Yesterday ran {:.0} mmHg above your average. One day is noise; \
             focus on sleep and movement today.",
            yesterday - avg
        )
    } else {
        "You're tracking right on your average. Steady wins here.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    struct StubStores {
        record: Option<DailyHealthRecord>,
        fail_baselines: bool,
        runs: Mutex<Vec<JobRun>>,
    }

    impl StubStores {
        fn new(record: Option<DailyHealthRecord>) -> Arc<Self> {
            Arc::new(Self {
                record,
                fail_baselines: false,
                runs: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl HealthRecordStore for StubStores {
        async fn get_record(&self, _date: NaiveDate) -> Result<Option<DailyHealthRecord>> {
            Ok(self.record.clone())
        }

        async fn get_range(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<DailyHealthRecord>> {
            Ok(vec![])
        }

        async fn baselines(&self, _as_of: NaiveDate, _window_days: i64) -> Result<Baselines> {
            if self.fail_baselines {
                return Err(pulse_core::Error::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(Baselines {
                avg_systolic: Some(134.0),
                avg_sleep_hours: Some(7.2),
                avg_steps: Some(8_500.0),
                avg_vo2_max: Some(38.0),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl ProfileStore for StubStores {
        async fn get_profile(&self) -> Result<UserProfile> {
            Ok(UserProfile::default())
        }
    }

    #[async_trait]
    impl JobLogStore for StubStores {
        async fn append_job_run(&self, run: &JobRun) -> Result<()> {
            self.runs.lock().unwrap().push(run.clone());
            Ok(())
        }
    }

    fn generator(stores: Arc<StubStores>) -> DailyBriefingGenerator {
        DailyBriefingGenerator::new(stores.clone(), stores.clone(), stores)
    }

    fn full_record() -> DailyHealthRecord {
        DailyHealthRecord {
            date: d("2026-01-13"),
            systolic: Some(138.5),
            diastolic: Some(88.0),
            sleep_hours: Some(6.2),
            steps: Some(7_200.0),
            vo2_max: Some(37.5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn briefing_covers_yesterday_prediction_and_recommendations() {
        let stores = StubStores::new(Some(full_record()));
        let briefing = generator(stores.clone())
            .generate(d("2026-01-14"))
            .await
            .unwrap();

        assert!(briefing.text.starts_with("MORNING BRIEFING: 2026-01-14"));
        assert!(briefing.text.contains("YESTERDAY'S SUMMARY"));
        assert!(briefing.text.contains("139/88 mmHg (stage 1 hypertension)"));
        assert!(briefing.text.contains("Sleep: 6.2 hours (fair)"));
        assert!(briefing.text.contains("TODAY'S PREDICTION"));
        assert!(briefing.text.contains("RECOMMENDATIONS"));
        assert!(briefing.text.contains("1. Prioritize sleep"));
        assert!(briefing.text.contains("2. Add 2800 steps"));
    }

    #[tokio::test]
    async fn missing_yesterday_still_completes() {
        let stores = StubStores::new(None);
        let briefing = generator(stores.clone())
            .generate(d("2026-01-14"))
            .await
            .unwrap();

        assert!(briefing.text.contains("No data recorded for yesterday"));
        assert!(briefing.text.contains("historical averages"));
        // Prediction still present from baselines.
        assert!(briefing.text.contains("Expected systolic: 134"));

        let runs = stores.runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].succeeded);
    }

    #[tokio::test]
    async fn store_failure_logs_a_failed_run() {
        let stores = Arc::new(StubStores {
            record: None,
            fail_baselines: true,
            runs: Mutex::new(vec![]),
        });
        let result = generator(stores.clone()).generate(d("2026-01-14")).await;
        assert!(result.is_err());

        let runs = stores.runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        assert!(!runs[0].succeeded);
    }

    #[test]
    fn sleep_deficit_raises_the_prediction() {
        let baselines = Baselines {
            avg_systolic: Some(134.0),
            ..Default::default()
        };
        let profile = UserProfile::default();
        let short_sleep = DailyHealthRecord {
            sleep_hours: Some(5.0),
            ..full_record()
        };

        let flat = prediction_section(None, &baselines, &profile);
        let raised = prediction_section(Some(&short_sleep), &baselines, &profile);
        assert!(flat.contains("134 mmHg"));
        // Two hours short of the 7-hour goal adds 2 * 3.1 mmHg.
        assert!(raised.contains("140 mmHg"));
    }

    #[test]
    fn on_track_day_earns_maintenance_message() {
        let baselines = Baselines {
            avg_sleep_hours: Some(7.5),
            avg_steps: Some(11_000.0),
            avg_vo2_max: Some(44.0),
            ..Default::default()
        };
        let recs = recommendations(None, &baselines, &UserProfile::default());
        assert_eq!(recs, vec!["Maintain your current healthy habits!".to_string()]);
    }
}
