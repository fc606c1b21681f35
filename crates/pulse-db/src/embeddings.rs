//! Day-summary embedding index backed by pgvector.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::{debug, trace};

use pulse_core::{DayEmbeddingIndex, EmbeddingBackend, Error, Result, SimilarDay};

/// PostgreSQL + pgvector implementation of DayEmbeddingIndex.
///
/// Each day's natural-language summary is embedded once and upserted under
/// its date. Similarity queries embed the query text with the same backend
/// and rank by cosine distance.
pub struct PgDayEmbeddingIndex {
    pool: PgPool,
    backend: Arc<dyn EmbeddingBackend>,
}

impl PgDayEmbeddingIndex {
    /// Create a new index over the given pool and embedding backend.
    pub fn new(pool: PgPool, backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { pool, backend }
    }

    async fn embed_one(&self, text: &str) -> Result<pgvector::Vector> {
        let mut vectors = self.backend.embed_texts(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("backend returned no vectors".to_string()))
    }
}

#[async_trait]
impl DayEmbeddingIndex for PgDayEmbeddingIndex {
    async fn upsert_day(&self, date: NaiveDate, summary: &str) -> Result<()> {
        let vector = self.embed_one(summary).await?;

        sqlx::query(
            "INSERT INTO day_embedding (date, summary, vector, model, updated_at)
             VALUES ($1, $2, $3, $4, NOW())
             ON CONFLICT (date) DO UPDATE
                SET summary = EXCLUDED.summary,
                    vector = EXCLUDED.vector,
                    model = EXCLUDED.model,
                    updated_at = NOW()",
        )
        .bind(date)
        .bind(summary)
        .bind(&vector)
        .bind(self.backend.model_name())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "index",
            op = "upsert_day",
            date = %date,
            "Day embedding upserted"
        );
        Ok(())
    }

    async fn similar_days(&self, text: &str, k: i64) -> Result<Vec<SimilarDay>> {
        let query_vec = self.embed_one(text).await?;

        let rows = sqlx::query(
            "SELECT date, summary, 1.0 - (vector <=> $1::vector) AS score
             FROM day_embedding
             ORDER BY vector <=> $1::vector
             LIMIT $2",
        )
        .bind(&query_vec)
        .bind(k)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let hits: Vec<SimilarDay> = rows
            .into_iter()
            .map(|row| {
                let hit = SimilarDay {
                    date: row.get("date"),
                    score: row.get::<f64, _>("score") as f32,
                    summary: row.get("summary"),
                };
                trace!(
                    subsystem = "index",
                    op = "similar_days",
                    date = %hit.date,
                    score = hit.score,
                    "Similar day hit"
                );
                hit
            })
            .collect();

        debug!(
            subsystem = "index",
            op = "similar_days",
            result_count = hits.len(),
            "Similarity search complete"
        );
        Ok(hits)
    }
}
