use anyhow::Result;
use ingest_core::FetchOutcome;

use crate::db::CacheDb;
use crate::{ts_from_db, ts_to_db};

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    feed_id: String,
    attempted_at: String,
    items_count: i64,
    succeeded: bool,
    error_detail: Option<String>,
}

impl CacheDb {
    /// Append one audit row. Outcomes are observability only; nothing in
    /// the ingestion path reads them back.
    pub async fn record_outcome(&self, outcome: &FetchOutcome) -> Result<()> {
        sqlx::query(
            "INSERT INTO fetch_outcomes
             (feed_id, attempted_at, items_count, succeeded, error_detail)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&outcome.feed_id)
        .bind(ts_to_db(outcome.attempted_at))
        .bind(outcome.items_count)
        .bind(outcome.succeeded)
        .bind(&outcome.error_detail)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Latest outcomes for a feed, newest first.
    pub async fn recent_outcomes(&self, feed_id: &str, limit: i64) -> Result<Vec<FetchOutcome>> {
        let rows = sqlx::query_as::<_, OutcomeRow>(
            "SELECT feed_id, attempted_at, items_count, succeeded, error_detail
             FROM fetch_outcomes
             WHERE feed_id = ?
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(feed_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(FetchOutcome {
                    feed_id: row.feed_id,
                    attempted_at: ts_from_db(&row.attempted_at)?,
                    items_count: row.items_count,
                    succeeded: row.succeeded,
                    error_detail: row.error_detail,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outcomes_append_and_read_back_newest_first() {
        let db = CacheDb::new("sqlite::memory:").await.unwrap();

        db.record_outcome(&FetchOutcome::success("bars_15m", 42))
            .await
            .unwrap();
        db.record_outcome(&FetchOutcome::failure("bars_15m", "timed out"))
            .await
            .unwrap();

        let outcomes = db.recent_outcomes("bars_15m", 10).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].succeeded);
        assert_eq!(outcomes[0].error_detail.as_deref(), Some("timed out"));
        assert!(outcomes[1].succeeded);
        assert_eq!(outcomes[1].items_count, 42);
    }

    #[tokio::test]
    async fn outcomes_are_scoped_by_feed() {
        let db = CacheDb::new("sqlite::memory:").await.unwrap();

        db.record_outcome(&FetchOutcome::success("news:GLD", 3))
            .await
            .unwrap();

        assert!(db.recent_outcomes("bars_15m", 10).await.unwrap().is_empty());
        assert_eq!(db.recent_outcomes("news:GLD", 10).await.unwrap().len(), 1);
    }
}
