//! Daily health record repository implementation.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use sqlx::{PgPool, Row};
use tracing::debug;

use pulse_core::{Baselines, DailyHealthRecord, Error, HealthRecordStore, Result};

/// PostgreSQL implementation of HealthRecordStore.
///
/// Reads from the daily_health table maintained by the import pipeline.
/// This repository never writes.
pub struct PgHealthRecordRepository {
    pool: PgPool,
}

impl PgHealthRecordRepository {
    /// Create a new PgHealthRecordRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_record_row(row: sqlx::postgres::PgRow) -> DailyHealthRecord {
        DailyHealthRecord {
            date: row.get("date"),
            systolic: row.get("systolic"),
            diastolic: row.get("diastolic"),
            heart_rate: row.get("heart_rate"),
            steps: row.get("steps"),
            sleep_hours: row.get("sleep_hours"),
            sleep_efficiency_pct: row.get("sleep_efficiency_pct"),
            vo2_max: row.get("vo2_max"),
            hrv: row.get("hrv"),
            respiratory_rate: row.get("respiratory_rate"),
            active_calories: row.get("active_calories"),
            exercise_minutes: row.get("exercise_minutes"),
        }
    }
}

#[async_trait]
impl HealthRecordStore for PgHealthRecordRepository {
    async fn get_record(&self, date: NaiveDate) -> Result<Option<DailyHealthRecord>> {
        let row = sqlx::query(
            "SELECT date, systolic, diastolic, heart_rate, steps, sleep_hours,
                    sleep_efficiency_pct, vo2_max, hrv, respiratory_rate,
                    active_calories, exercise_minutes
             FROM daily_health
             WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_record_row))
    }

    async fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyHealthRecord>> {
        let rows = sqlx::query(
            "SELECT date, systolic, diastolic, heart_rate, steps, sleep_hours,
                    sleep_efficiency_pct, vo2_max, hrv, respiratory_rate,
                    active_calories, exercise_minutes
             FROM daily_health
             WHERE date BETWEEN $1 AND $2
             ORDER BY date",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            op = "get_range",
            result_count = rows.len(),
            "Fetched health records"
        );

        Ok(rows.into_iter().map(Self::parse_record_row).collect())
    }

    async fn baselines(&self, as_of: NaiveDate, window_days: i64) -> Result<Baselines> {
        let start = as_of
            .checked_sub_days(Days::new(window_days.max(0) as u64))
            .unwrap_or(as_of);

        // AVG and STDDEV_SAMP ignore NULLs, matching the sparse-record
        // contract: a metric absent on some days still contributes a
        // baseline from the days it was recorded.
        let row = sqlx::query(
            "SELECT AVG(systolic)        AS avg_systolic,
                    AVG(diastolic)       AS avg_diastolic,
                    AVG(sleep_hours)     AS avg_sleep_hours,
                    AVG(steps)           AS avg_steps,
                    AVG(vo2_max)         AS avg_vo2_max,
                    AVG(hrv)             AS avg_hrv,
                    STDDEV_SAMP(systolic) AS systolic_stddev
             FROM daily_health
             WHERE date BETWEEN $1 AND $2",
        )
        .bind(start)
        .bind(as_of)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Baselines {
            avg_systolic: row.get("avg_systolic"),
            avg_diastolic: row.get("avg_diastolic"),
            avg_sleep_hours: row.get("avg_sleep_hours"),
            avg_steps: row.get("avg_steps"),
            avg_vo2_max: row.get("avg_vo2_max"),
            avg_hrv: row.get("avg_hrv"),
            systolic_stddev: row.get("systolic_stddev"),
        })
    }
}
