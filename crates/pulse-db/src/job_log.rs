//! Scheduled-job audit log repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use pulse_core::{Error, JobLogStore, JobRun, Result};

/// PostgreSQL implementation of JobLogStore.
pub struct PgJobLogRepository {
    pool: PgPool,
}

impl PgJobLogRepository {
    /// Create a new PgJobLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The most recent runs for one job, newest first.
    pub async fn recent_runs(&self, job_name: &str, limit: i64) -> Result<Vec<JobRun>> {
        let rows = sqlx::query(
            "SELECT job_name, succeeded, detail, ran_at
             FROM job_run
             WHERE job_name = $1
             ORDER BY ran_at DESC
             LIMIT $2",
        )
        .bind(job_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| JobRun {
                job_name: row.get("job_name"),
                succeeded: row.get("succeeded"),
                detail: row.get("detail"),
                ran_at: row.get("ran_at"),
            })
            .collect())
    }
}

#[async_trait]
impl JobLogStore for PgJobLogRepository {
    async fn append_job_run(&self, run: &JobRun) -> Result<()> {
        sqlx::query(
            "INSERT INTO job_run (job_name, succeeded, detail, ran_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&run.job_name)
        .bind(run.succeeded)
        .bind(&run.detail)
        .bind(run.ran_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
