//! Conversation turn repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use pulse_core::{
    BackendId, ConversationTurn, Error, Intent, Result, TurnStatus, TurnStore,
};

/// PostgreSQL implementation of TurnStore. Append-only: turns are never
/// updated or deleted.
pub struct PgTurnRepository {
    pool: PgPool,
}

impl PgTurnRepository {
    /// Create a new PgTurnRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn status_to_columns(status: &TurnStatus) -> (&'static str, Option<&str>) {
        match status {
            TurnStatus::Delivered => ("delivered", None),
            TurnStatus::Failed(reason) => ("failed", Some(reason.as_str())),
        }
    }

    fn parse_turn_row(row: sqlx::postgres::PgRow) -> ConversationTurn {
        let status_str: String = row.get("status");
        let fail_reason: Option<String> = row.get("fail_reason");
        let status = match status_str.as_str() {
            "delivered" => TurnStatus::Delivered,
            _ => TurnStatus::Failed(fail_reason.unwrap_or_default()),
        };

        let intent_str: String = row.get("intent");
        let backend_str: Option<String> = row.get("backend");

        ConversationTurn {
            id: row.get("id"),
            session_id: row.get("session_id"),
            query_text: row.get("query_text"),
            intent: Intent::from_str_loose(&intent_str).unwrap_or(Intent::General),
            backend: backend_str.as_deref().and_then(BackendId::from_str_loose),
            response_text: row.get("response_text"),
            input_tokens: row.get("input_tokens"),
            output_tokens: row.get("output_tokens"),
            cost_usd: row.get("cost_usd"),
            status,
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl TurnStore for PgTurnRepository {
    async fn append_turn(&self, turn: &ConversationTurn) -> Result<()> {
        let (status, fail_reason) = Self::status_to_columns(&turn.status);

        sqlx::query(
            "INSERT INTO conversation_turn
                (id, session_id, query_text, intent, backend, response_text,
                 input_tokens, output_tokens, cost_usd, status, fail_reason,
                 created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(turn.id)
        .bind(&turn.session_id)
        .bind(&turn.query_text)
        .bind(turn.intent.to_string())
        .bind(turn.backend.map(|b| b.to_string()))
        .bind(&turn.response_text)
        .bind(turn.input_tokens)
        .bind(turn.output_tokens)
        .bind(turn.cost_usd)
        .bind(status)
        .bind(fail_reason)
        .bind(turn.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            op = "append_turn",
            session_id = %turn.session_id,
            "Turn persisted"
        );
        Ok(())
    }

    async fn recent_turns(&self, session_id: &str, n: i64) -> Result<Vec<ConversationTurn>> {
        // Take the newest n, then flip to oldest-first for prompt assembly.
        let rows = sqlx::query(
            "SELECT id, session_id, query_text, intent, backend, response_text,
                    input_tokens, output_tokens, cost_usd, status, fail_reason,
                    created_at
             FROM conversation_turn
             WHERE session_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(session_id)
        .bind(n)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut turns: Vec<ConversationTurn> =
            rows.into_iter().map(Self::parse_turn_row).collect();
        turns.reverse();
        Ok(turns)
    }
}
