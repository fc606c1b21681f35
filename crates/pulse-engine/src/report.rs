//! Weekly report job.
//!
//! Aggregates the last seven days of records into per-metric statistics,
//! compares them to the prior week and the profile goals, picks out the
//! best and worst days, and composes a plain-text report. Like the morning
//! briefing this is assembled locally with no model call.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{error, info};

use pulse_core::{
    DailyHealthRecord, HealthRecordStore, JobLogStore, JobRun, ProfileStore, Result,
    UserProfile,
};

const JOB_NAME: &str = "weekly_report";

const SECTION_RULE: &str = "============================================================";

/// A composed report for one week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub text: String,
}

/// Per-week aggregate statistics over whatever metrics were recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekStats {
    pub systolic_avg: Option<f64>,
    pub systolic_min: Option<f64>,
    pub systolic_max: Option<f64>,
    pub systolic_stddev: Option<f64>,
    pub diastolic_avg: Option<f64>,
    pub bp_days: usize,
    pub sleep_avg: Option<f64>,
    pub sleep_days_under_goal: usize,
    pub steps_avg: Option<f64>,
    pub steps_total: f64,
    pub steps_days_over_goal: usize,
    pub vo2_latest: Option<f64>,
    pub total_days: usize,
}

/// Direction of the within-week blood pressure movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekTrend {
    Improving,
    Worsening,
    Stable,
}

/// Generates the weekly report and records the job run.
pub struct WeeklyReportGenerator {
    records: Arc<dyn HealthRecordStore>,
    profile: Arc<dyn ProfileStore>,
    jobs: Arc<dyn JobLogStore>,
}

impl WeeklyReportGenerator {
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

    /// Compose the report for the week ending on `week_end` (inclusive).
    pub async fn generate(&self, week_end: NaiveDate) -> Result<WeeklyReport> {
        match self.compose(week_end).await {
            Ok(report) => {
                self.log_run(JobRun::success(
                    JOB_NAME,
                    format!("report composed for week ending {}", week_end),
                ))
                .await;
                info!(
                    subsystem = "jobs",
                    job = JOB_NAME,
                    week_end = %week_end,
                    "Weekly report generated"
                );
                Ok(report)
            }
            Err(e) => {
                self.log_run(JobRun::failure(JOB_NAME, e.to_string())).await;
                error!(
                    subsystem = "jobs",
                    job = JOB_NAME,
                    week_end = %week_end,
                    "Weekly report failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn compose(&self, week_end: NaiveDate) -> Result<WeeklyReport> {
        let week_start = week_end
            .checked_sub_days(Days::new(6))
            .unwrap_or(week_end);
        let prev_end = week_start
            .checked_sub_days(Days::new(1))
            .unwrap_or(week_start);
        let prev_start = prev_end.checked_sub_days(Days::new(6)).unwrap_or(prev_end);

        let profile = self.profile.get_profile().await.unwrap_or_default();
        let week = self.records.get_range(week_start, week_end).await?;
        let prev = self.records.get_range(prev_start, prev_end).await?;

        let stats = week_stats(&week, &profile);
        let prev_stats = week_stats(&prev, &profile);

        let text = compose_text(week_start, week_end, &week, &stats, &prev_stats, &profile);

        Ok(WeeklyReport {
            week_start,
            week_end,
            text,
        })
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

/// Aggregate one week of records.
pub fn week_stats(records: &[DailyHealthRecord], profile: &UserProfile) -> WeekStats {
    let mut stats = WeekStats {
        total_days: records.len(),
        ..Default::default()
    };

    let systolic: Vec<f64> = records.iter().filter_map(|r| r.systolic).collect();
    if !systolic.is_empty() {
        stats.bp_days = systolic.len();
        stats.systolic_avg = Some(mean(&systolic));
        stats.systolic_min = systolic.iter().cloned().reduce(f64::min);
        stats.systolic_max = systolic.iter().cloned().reduce(f64::max);
        stats.systolic_stddev = stddev(&systolic);
    }

    let diastolic: Vec<f64> = records.iter().filter_map(|r| r.diastolic).collect();
    if !diastolic.is_empty() {
        stats.diastolic_avg = Some(mean(&diastolic));
    }

    let sleep: Vec<f64> = records.iter().filter_map(|r| r.sleep_hours).collect();
    if !sleep.is_empty() {
        stats.sleep_avg = Some(mean(&sleep));
        stats.sleep_days_under_goal = sleep
            .iter()
            .filter(|&&h| h < profile.sleep_goal.target)
            .count();
    }

    let steps: Vec<f64> = records.iter().filter_map(|r| r.steps).collect();
    if !steps.is_empty() {
        stats.steps_avg = Some(mean(&steps));
        stats.steps_total = steps.iter().sum();
        stats.steps_days_over_goal = steps
            .iter()
            .filter(|&&s| s >= profile.steps_goal.target)
            .count();
    }

    // Records come back oldest-first; the latest reading wins.
    stats.vo2_latest = records.iter().rev().find_map(|r| r.vo2_max);

    stats
}

/// Compare the first and second half of the week's readings.
pub fn week_trend(records: &[DailyHealthRecord]) -> Option<WeekTrend> {
    let readings: Vec<f64> = records.iter().filter_map(|r| r.systolic).collect();
    if readings.len() < 3 {
        return None;
    }
    let mid = readings.len() / 2;
    let early = mean(&readings[..mid]);
    let late = mean(&readings[mid..]);
    Some(if late < early - 2.0 {
        WeekTrend::Improving
    } else if late > early + 2.0 {
        WeekTrend::Worsening
    } else {
        WeekTrend::Stable
    })
}

fn compose_text(
    week_start: NaiveDate,
    week_end: NaiveDate,
    week: &[DailyHealthRecord],
    stats: &WeekStats,
    prev: &WeekStats,
    profile: &UserProfile,
) -> String {
    let mut out = format!("WEEKLY HEALTH REPORT: {} - {}\n", week_start, week_end);

    if stats.total_days == 0 {
        out.push_str("\nNo health data recorded this week.\n");
        return out;
    }

    out.push_str(&format!("\n{}\n1. BLOOD PRESSURE\n{}\n", SECTION_RULE, SECTION_RULE));
    if let (Some(avg), Some(min), Some(max)) =
        (stats.systolic_avg, stats.systolic_min, stats.systolic_max)
    {
        let dia = stats
            .diastolic_avg
            .map(|d| format!("/{:.0}", d))
            .unwrap_or_default();
        out.push_str(&format!("Average: {:.0}{} mmHg\n", avg, dia));
        out.push_str(&format!("Range: {:.0} - {:.0} mmHg (systolic)\n", min, max));
        if let Some(sd) = stats.systolic_stddev {
            out.push_str(&format!("Variability: {:.1} mmHg\n", sd));
        }
        out.push_str(&format!("Days with readings: {}/7\n", stats.bp_days));

        if let Some(prev_avg) = prev.systolic_avg {
            out.push_str(&format!("vs previous week: {:+.1} mmHg\n", avg - prev_avg));
        }

        let goal = profile.bp_goal.target;
        if avg < goal {
            out.push_str(&format!("Status: below your {:.0} mmHg goal\n", goal));
        } else {
            out.push_str(&format!(
                "Status: {:.0} mmHg above your {:.0} mmHg goal\n",
                avg - goal,
                goal
            ));
        }
    } else {
        out.push_str("No blood pressure readings this week.\n");
    }

    out.push_str(&format!("\n{}\n2. SLEEP\n{}\n", SECTION_RULE, SECTION_RULE));
    if let Some(avg) = stats.sleep_avg {
        out.push_str(&format!("Average: {:.1} hours/night\n", avg));
        out.push_str(&format!(
            "Nights under {:.0} hours: {}/7\n",
            profile.sleep_goal.target, stats.sleep_days_under_goal
        ));
        if let Some(prev_avg) = prev.sleep_avg {
            out.push_str(&format!("vs previous week: {:+.1} hours\n", avg - prev_avg));
        }
    } else {
        out.push_str("No sleep data recorded this week.\n");
    }

    out.push_str(&format!("\n{}\n3. ACTIVITY\n{}\n", SECTION_RULE, SECTION_RULE));
    if let Some(avg) = stats.steps_avg {
        out.push_str(&format!("Daily average: {:.0} steps\n", avg));
        out.push_str(&format!("Weekly total: {:.0} steps\n", stats.steps_total));
        out.push_str(&format!(
            "Days over {:.0}: {}/7\n",
            profile.steps_goal.target, stats.steps_days_over_goal
        ));
        if let Some(prev_avg) = prev.steps_avg {
            out.push_str(&format!("vs previous week: {:+.0} steps\n", avg - prev_avg));
        }
    } else {
        out.push_str("No step data recorded this week.\n");
    }

    if let Some(vo2) = stats.vo2_latest {
        out.push_str(&format!("\n{}\n4. FITNESS\n{}\n", SECTION_RULE, SECTION_RULE));
        out.push_str(&format!("Latest VO2 max: {:.1} mL/kg/min\n", vo2));
        let gap = profile.vo2_max_goal.target - vo2;
        if gap > 0.0 {
            out.push_str(&format!(
                "Gap to your {:.1} goal: {:.1} mL/kg/min\n",
                profile.vo2_max_goal.target, gap
            ));
        } else {
            out.push_str("Status: goal achieved\n");
        }
    }

    out.push_str(&format!("\n{}\n5. KEY DAYS\n{}\n", SECTION_RULE, SECTION_RULE));
    let mut bp_days: Vec<&DailyHealthRecord> =
        week.iter().filter(|r| r.systolic.is_some()).collect();
    bp_days.sort_by(|a, b| {
        a.systolic
            .partial_cmp(&b.systolic)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let (Some(best), Some(worst)) = (bp_days.first(), bp_days.last()) {
        out.push_str(&format!("Best day: {}\n", pulse_core::daily_summary(best)));
        if best.date != worst.date {
            out.push_str(&format!(
                "Challenging day: {}\n",
                pulse_core::daily_summary(worst)
            ));
            out.push_str(&best_day_contrast(best, worst));
        }
    } else {
        out.push_str("Not enough readings to pick out key days.\n");
    }

    match week_trend(week) {
        Some(WeekTrend::Improving) => {
            out.push_str("\nTrend: blood pressure improving through the week.\n")
        }
        Some(WeekTrend::Worsening) => out.push_str(
            "\nTrend: blood pressure increased through the week. Review sleep \
             and stress.\n",
        ),
        Some(WeekTrend::Stable) => {
            out.push_str("\nTrend: blood pressure stable throughout the week.\n")
        }
        None => {}
    }

    out.push_str(&format!(
        "\n{}\n6. NEXT WEEK\n{}\n",
        SECTION_RULE, SECTION_RULE
    ));
    for (i, rec) in next_week_actions(stats, profile).iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, rec));
    }

    out
}

/// What a day with a lower reading had going for it.
fn best_day_contrast(best: &DailyHealthRecord, worst: &DailyHealthRecord) -> String {
    let mut out = String::new();

    if let (Some(b), Some(w)) = (best.sleep_hours, worst.sleep_hours) {
        if (b - w).abs() > 1.0 {
            out.push_str(&format!(
                "Pattern: best day had {:+.1} hours more sleep\n",
                b - w
            ));
        }
    }
    if let (Some(b), Some(w)) = (best.steps, worst.steps) {
        if (b - w).abs() > 2_000.0 {
            out.push_str(&format!("Pattern: best day had {:+.0} more steps\n", b - w));
        }
    }

    out
}

fn next_week_actions(stats: &WeekStats, profile: &UserProfile) -> Vec<String> {
    let mut actions = Vec::new();

    if stats.sleep_days_under_goal >= 3 {
        actions.push(format!(
            "Prioritize sleep: {} nights fell under {:.0} hours this week.",
            stats.sleep_days_under_goal, profile.sleep_goal.target
        ));
    }

    if stats.total_days > 0 && stats.steps_days_over_goal < 4 {
        actions.push(format!(
            "Hit {:.0} steps at least 5 days; only {} days made it this week.",
            profile.steps_goal.target, stats.steps_days_over_goal
        ));
    }

    if let Some(avg) = stats.systolic_avg {
        let gap = avg - profile.bp_goal.target;
        if gap > 0.0 {
            actions.push(format!(
                "Bring average blood pressure down {:.0} mmHg toward your \
                 {:.0} mmHg goal.",
                gap.min(5.0),
                profile.bp_goal.target
            ));
        }
    }

    if let Some(vo2) = stats.vo2_latest {
        if vo2 < profile.vo2_max_goal.target {
            actions.push(
                "Schedule 3-4 cardio sessions of 30+ minutes to move VO2 max."
                    .to_string(),
            );
        }
    }

    if actions.is_empty() {
        actions.push("Hold the line; every goal was on track this week.".to_string());
    }

    actions.truncate(5);
    actions
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}
