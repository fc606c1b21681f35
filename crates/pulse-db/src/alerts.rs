//! Alert repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use pulse_core::{Alert, AlertPriority, AlertStore, Error, Result};

/// PostgreSQL implementation of AlertStore.
pub struct PgAlertRepository {
    pool: PgPool,
}

impl PgAlertRepository {
    /// Create a new PgAlertRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_priority(s: &str) -> AlertPriority {
        match s {
            "critical" => AlertPriority::Critical,
            "warning" => AlertPriority::Warning,
            "celebration" => AlertPriority::Celebration,
            _ => AlertPriority::Info,
        }
    }

    /// The most recent alerts, newest first.
    pub async fn recent_alerts(&self, limit: i64) -> Result<Vec<Alert>> {
        let rows = sqlx::query(
            "SELECT kind, priority, title, message, created_at
             FROM alert
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let priority: String = row.get("priority");
                Alert {
                    kind: row.get("kind"),
                    priority: Self::parse_priority(&priority),
                    title: row.get("title"),
                    message: row.get("message"),
                    created_at: row.get("created_at"),
                }
            })
            .collect())
    }
}

#[async_trait]
impl AlertStore for PgAlertRepository {
    async fn append_alert(&self, alert: &Alert) -> Result<()> {
        sqlx::query(
            "INSERT INTO alert (kind, priority, title, message, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&alert.kind)
        .bind(alert.priority.to_string())
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
