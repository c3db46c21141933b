use anyhow::Result;
use ingest_core::BarInterval;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

#[derive(Clone)]
pub struct CacheDb {
    pool: SqlitePool,
}

impl CacheDb {
    /// Open (creating if missing) and initialize the cache database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;

        tracing::info!("Cache database initialized at {}", database_url);
        Ok(db)
    }

    async fn init_schema(&self) -> Result<()> {
        // WAL lets the bar and news cycles write concurrently.
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await
            .ok();

        for interval in BarInterval::ALL {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    timestamp TEXT PRIMARY KEY,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    fetched_at TEXT NOT NULL
                )",
                interval.table_name()
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS gold_news (
                content_hash TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                link TEXT NOT NULL,
                publisher TEXT NOT NULL DEFAULT 'Unknown',
                symbol TEXT NOT NULL,
                published_at TEXT NOT NULL,
                sentiment_score REAL NOT NULL DEFAULT 0,
                category TEXT NOT NULL DEFAULT 'general',
                keywords TEXT NOT NULL DEFAULT '[]',
                fetched_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_news_published ON gold_news(published_at)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_news_symbol ON gold_news(symbol)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_news_category ON gold_news(category)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS fetch_outcomes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                feed_id TEXT NOT NULL,
                attempted_at TEXT NOT NULL,
                items_count INTEGER NOT NULL,
                succeeded INTEGER NOT NULL,
                error_detail TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_outcomes_feed ON fetch_outcomes(feed_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_db_creation() {
        let db = CacheDb::new("sqlite::memory:").await.unwrap();
        assert!(db.pool().acquire().await.is_ok());
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let db = CacheDb::new("sqlite::memory:").await.unwrap();
        db.init_schema().await.unwrap();
    }
}
