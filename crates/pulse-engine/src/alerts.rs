//! Alert scan job.
//!
//! Runs a fixed set of threshold and streak rules over the recent record
//! window and the baselines. The rules themselves are pure functions over
//! the loaded window; only persisting an alert can fail, and a failure
//! there never drops the remaining alerts.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::{error, info, warn};

use pulse_core::{
    defaults, Alert, AlertPriority, AlertStore, Baselines, DailyHealthRecord,
    HealthRecordStore, JobLogStore, JobRun, ProfileStore, Result, UserProfile,
};

const JOB_NAME: &str = "alert_scan";

/// Week-over-week systolic movement that rates a trend alert.
const TREND_ALERT_MMHG: f64 = 5.0;

/// Scans recent records for anomalies, streaks, and trends.
pub struct AlertScanner {
    records: Arc<dyn HealthRecordStore>,
    profile: Arc<dyn ProfileStore>,
    alerts: Arc<dyn AlertStore>,
    jobs: Arc<dyn JobLogStore>,
}

impl AlertScanner {
    pub fn new(
        records: Arc<dyn HealthRecordStore>,
        profile: Arc<dyn ProfileStore>,
        alerts: Arc<dyn AlertStore>,
        jobs: Arc<dyn JobLogStore>,
    ) -> Self {
        Self {
            records,
            profile,
            alerts,
            jobs,
        }
    }

    /// Run every rule against the window ending on `check_date`, persist
    /// whatever fires, and record the job run.
    pub async fn scan(&self, check_date: NaiveDate) -> Result<Vec<Alert>> {
        match self.run_rules(check_date).await {
            Ok(alerts) => {
                let mut persisted = 0usize;
                for alert in &alerts {
                    match self.alerts.append_alert(alert).await {
                        Ok(()) => persisted += 1,
                        Err(e) => warn!(
                            subsystem = "jobs",
                            job = JOB_NAME,
                            title = %alert.title,
                            "Failed to persist alert: {}",
                            e
                        ),
                    }
                }
                self.log_run(JobRun::success(
                    JOB_NAME,
                    format!("{} alerts raised, {} persisted", alerts.len(), persisted),
                ))
                .await;
                info!(
                    subsystem = "jobs",
                    job = JOB_NAME,
                    date = %check_date,
                    result_count = alerts.len(),
                    "Alert scan complete"
                );
                Ok(alerts)
            }
            Err(e) => {
                self.log_run(JobRun::failure(JOB_NAME, e.to_string())).await;
                error!(
                    subsystem = "jobs",
                    job = JOB_NAME,
                    date = %check_date,
                    "Alert scan failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn run_rules(&self, check_date: NaiveDate) -> Result<Vec<Alert>> {
        let start = check_date
            .checked_sub_days(Days::new(defaults::ALERT_WINDOW_DAYS as u64))
            .unwrap_or(check_date);
        let window = self.records.get_range(start, check_date).await?;
        let baselines = self
            .records
            .baselines(check_date, defaults::BASELINE_WINDOW_DAYS)
            .await?;
        let profile = self.profile.get_profile().await.unwrap_or_default();

        let mut alerts = Vec::new();
        alerts.extend(bp_anomaly(check_date, &window, &baselines));
        alerts.extend(short_sleep_streak(&window, &baselines, &profile));
        alerts.extend(bp_goal_streak(&window, &profile));
        alerts.extend(step_goal_streak(&window, &profile));
        alerts.extend(weekly_trend(check_date, &window));
        Ok(alerts)
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

fn make_alert(
    kind: &str,
    priority: AlertPriority,
    title: &str,
    message: String,
) -> Alert {
    Alert {
        kind: kind.to_string(),
        priority,
        title: title.to_string(),
        message,
        created_at: Utc::now(),
    }
}

/// Today's reading far outside the baseline band, in either direction.
fn bp_anomaly(
    check_date: NaiveDate,
    window: &[DailyHealthRecord],
    baselines: &Baselines,
) -> Vec<Alert> {
    let (Some(avg), Some(sd)) = (baselines.avg_systolic, baselines.systolic_stddev) else {
        return vec![];
    };
    let Some(today) = window
        .iter()
        .find(|r| r.date == check_date)
        .and_then(|r| r.systolic)
    else {
        return vec![];
    };

    let band = defaults::BP_SPIKE_SD * sd;
    if today > avg + band && today > defaults::BP_STAGE1_MAX {
        vec![make_alert(
            "bp_spike",
            AlertPriority::Warning,
            "Elevated BP Detected",
            format!(
                "Today's reading ({:.0} mmHg) is well above your recent average \
                 ({:.0} mmHg). Check stress, sleep, and activity.",
                today, avg
            ),
        )]
    } else if today < avg - band && today < defaults::BP_ELEVATED_MAX {
        vec![make_alert(
            "bp_low",
            AlertPriority::Celebration,
            "Excellent BP Reading",
            format!(
                "Today's reading ({:.0} mmHg) is {:.0} mmHg below your average. \
                 Note what you did differently.",
                today,
                avg - today
            ),
        )]
    } else {
        vec![]
    }
}

/// Consecutive short nights, counted backwards from the newest record.
fn short_sleep_streak(
    window: &[DailyHealthRecord],
    baselines: &Baselines,
    profile: &UserProfile,
) -> Vec<Alert> {
    let mut streak = 0usize;
    for rec in window.iter().rev() {
        match rec.sleep_hours {
            Some(hours) if hours < profile.sleep_goal.target => streak += 1,
            _ => break,
        }
    }

    if streak < defaults::SHORT_SLEEP_STREAK {
        return vec![];
    }

    // Roughly the per-hour sleep effect for one lost hour per short night.
    let avg = baselines.avg_systolic.unwrap_or(defaults::BP_STAGE1_MAX);
    let predicted = avg + streak as f64 * defaults::SLEEP_COEFF.abs() / 2.0;

    vec![make_alert(
        "short_sleep_streak",
        AlertPriority::Warning,
        "Poor Sleep Streak",
        format!(
            "{} consecutive nights under {:.0} hours of sleep. Tomorrow's \
             systolic is tracking toward {:.0} mmHg. Prioritize {:.0}+ hours tonight.",
            streak,
            profile.sleep_goal.target,
            predicted,
            profile.sleep_goal.target
        ),
    )]
}

/// Celebrate 7- and 14-day runs under the BP goal.
fn bp_goal_streak(window: &[DailyHealthRecord], profile: &UserProfile) -> Vec<Alert> {
    let mut streak = 0usize;
    for rec in window.iter().rev() {
        match rec.systolic {
            Some(s) if profile.bp_goal.is_met(s) => streak += 1,
            _ => break,
        }
    }

    let goal = profile.bp_goal.target;
    match streak {
        7 => vec![make_alert(
            "bp_goal_streak",
            AlertPriority::Celebration,
            "7-Day BP Streak",
            format!(
                "7 consecutive days with blood pressure under {:.0} mmHg. Keep it going.",
                goal
            ),
        )],
        14 => vec![make_alert(
            "bp_goal_streak",
            AlertPriority::Celebration,
            "2-Week BP Streak",
            format!(
                "14 consecutive days under {:.0} mmHg. Your habits are clearly working.",
                goal
            ),
        )],
        _ => vec![],
    }
}

/// A full week of hitting the step goal.
fn step_goal_streak(window: &[DailyHealthRecord], profile: &UserProfile) -> Vec<Alert> {
    let mut streak = 0usize;
    for rec in window.iter().rev() {
        match rec.steps {
            Some(s) if profile.steps_goal.is_met(s) => streak += 1,
            _ => break,
        }
    }

    if streak == defaults::STEP_GOAL_STREAK {
        vec![make_alert(
            "step_goal_streak",
            AlertPriority::Celebration,
            "Perfect Activity Week",
            format!(
                "{} consecutive days with {:.0}+ steps. Excellent for your blood pressure.",
                streak, profile.steps_goal.target
            ),
        )]
    } else {
        vec![]
    }
}

/// Week-over-week systolic movement of five or more points.
fn weekly_trend(check_date: NaiveDate, window: &[DailyHealthRecord]) -> Vec<Alert> {
    let split = match check_date.checked_sub_days(Days::new(6)) {
        Some(d) => d,
        None => return vec![],
    };

    let this_week: Vec<f64> = window
        .iter()
        .filter(|r| r.date >= split)
        .filter_map(|r| r.systolic)
        .collect();
    let last_week: Vec<f64> = window
        .iter()
        .filter(|r| r.date < split)
        .filter_map(|r| r.systolic)
        .collect();

    if this_week.len() < 3 || last_week.len() < 3 {
        return vec![];
    }

    let this_avg = this_week.iter().sum::<f64>() / this_week.len() as f64;
    let last_avg = last_week.iter().sum::<f64>() / last_week.len() as f64;
    let change = this_avg - last_avg;

    if change >= TREND_ALERT_MMHG {
        vec![make_alert(
            "trend_warning",
            AlertPriority::Warning,
            "BP Trending Up",
            format!(
                "Your blood pressure rose {:.0} mmHg this week (from {:.0} to \
                 {:.0} mmHg). Review sleep and stress.",
                change, last_avg, this_avg
            ),
        )]
    } else if change <= -TREND_ALERT_MMHG {
        vec![make_alert(
            "trend_positive",
            AlertPriority::Celebration,
            "BP Trending Down",
            format!(
                "Your blood pressure improved {:.0} mmHg this week (from {:.0} \
                 to {:.0} mmHg). Your habits are paying off.",
                change.abs(),
                last_avg,
                this_avg
            ),
        )]
    } else {
        vec![]
    }
}
