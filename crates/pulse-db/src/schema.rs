//! Schema bootstrap for the pulsecoach tables.
//!
//! Every statement is idempotent so the bootstrap can run at each startup.
//! The daily_health table is written by the import pipeline and read-only
//! here; everything else is owned by this crate.

use sqlx::PgPool;
use tracing::info;

use pulse_core::{defaults, Error, Result};

const STATEMENTS: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS vector",
    r#"
    CREATE TABLE IF NOT EXISTS daily_health (
        date                 DATE PRIMARY KEY,
        systolic             DOUBLE PRECISION,
        diastolic            DOUBLE PRECISION,
        heart_rate           DOUBLE PRECISION,
        steps                DOUBLE PRECISION,
        sleep_hours          DOUBLE PRECISION,
        sleep_efficiency_pct DOUBLE PRECISION,
        vo2_max              DOUBLE PRECISION,
        hrv                  DOUBLE PRECISION,
        respiratory_rate     DOUBLE PRECISION,
        active_calories      DOUBLE PRECISION,
        exercise_minutes     DOUBLE PRECISION
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_profile (
        id         INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
        profile    JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS conversation_turn (
        id            UUID PRIMARY KEY,
        session_id    TEXT NOT NULL,
        query_text    TEXT NOT NULL,
        intent        TEXT NOT NULL,
        backend       TEXT,
        response_text TEXT NOT NULL,
        input_tokens  BIGINT NOT NULL DEFAULT 0,
        output_tokens BIGINT NOT NULL DEFAULT 0,
        cost_usd      DOUBLE PRECISION NOT NULL DEFAULT 0,
        status        TEXT NOT NULL,
        fail_reason   TEXT,
        created_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS conversation_turn_session_idx
        ON conversation_turn (session_id, created_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS alert (
        id         BIGSERIAL PRIMARY KEY,
        kind       TEXT NOT NULL,
        priority   TEXT NOT NULL,
        title      TEXT NOT NULL,
        message    TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_run (
        id        BIGSERIAL PRIMARY KEY,
        job_name  TEXT NOT NULL,
        succeeded BOOLEAN NOT NULL,
        detail    TEXT NOT NULL,
        ran_at    TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Create all pulsecoach tables and indexes if they do not exist.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for stmt in STATEMENTS {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    // The embedding column dimension comes from configuration, so this one
    // is built rather than static.
    let day_embedding = format!(
        r#"
        CREATE TABLE IF NOT EXISTS day_embedding (
            date       DATE PRIMARY KEY,
            summary    TEXT NOT NULL,
            vector     vector({}) NOT NULL,
            model      TEXT NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        defaults::EMBED_DIMENSION
    );
    sqlx::query(&day_embedding)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "schema",
        op = "init",
        "Schema bootstrap complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_idempotent() {
        for stmt in STATEMENTS {
            assert!(stmt.contains("IF NOT EXISTS"));
        }
    }
}
