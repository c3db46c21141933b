use anyhow::Result;
use chrono::{Duration, Utc};
use ingest_core::{Article, ArticleCategory};

use crate::db::CacheDb;
use crate::{ts_from_db, ts_to_db};

/// Filters for the article read surface.
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    /// Only articles published in the last `days` days.
    pub days: i64,
    pub category: Option<ArticleCategory>,
    pub min_sentiment: Option<f64>,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            days: 7,
            category: None,
            min_sentiment: None,
        }
    }
}

/// Aggregate view of the cached news, for operator summaries and the
/// market brief.
#[derive(Debug, Clone)]
pub struct NewsSummary {
    pub total_articles: i64,
    pub recent_articles: i64,
    pub days: i64,
    pub average_sentiment: f64,
    /// (category, count) ordered by count descending.
    pub categories: Vec<(String, i64)>,
    /// (publisher, count) ordered by count descending, top five.
    pub top_publishers: Vec<(String, i64)>,
}

#[derive(sqlx::FromRow)]
struct ArticleRow {
    content_hash: String,
    title: String,
    summary: String,
    link: String,
    publisher: String,
    symbol: String,
    published_at: String,
    sentiment_score: f64,
    category: String,
    keywords: String,
    fetched_at: String,
}

const ARTICLE_COLUMNS: &str = "content_hash, title, summary, link, publisher, symbol, \
                               published_at, sentiment_score, category, keywords, fetched_at";

impl ArticleRow {
    fn into_article(self) -> Result<Article> {
        Ok(Article {
            content_hash: self.content_hash,
            title: self.title,
            summary: self.summary,
            link: self.link,
            publisher: self.publisher,
            symbol: self.symbol,
            published_at: ts_from_db(&self.published_at)?,
            sentiment_score: self.sentiment_score,
            category: ArticleCategory::from_str_lossy(&self.category),
            keywords: serde_json::from_str(&self.keywords).unwrap_or_default(),
            fetched_at: ts_from_db(&self.fetched_at)?,
        })
    }
}

impl CacheDb {
    /// Merge articles, skipping any whose fingerprint is already cached.
    /// First write wins; re-fetching the same article never creates a
    /// second row or mutates the existing one. Returns the number of rows
    /// actually inserted.
    pub async fn insert_articles(&self, articles: &[Article]) -> Result<u64> {
        if articles.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0u64;
        let mut tx = self.pool().begin().await?;

        for article in articles {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO gold_news
                 (content_hash, title, summary, link, publisher, symbol,
                  published_at, sentiment_score, category, keywords, fetched_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&article.content_hash)
            .bind(&article.title)
            .bind(&article.summary)
            .bind(&article.link)
            .bind(&article.publisher)
            .bind(&article.symbol)
            .bind(ts_to_db(article.published_at))
            .bind(article.sentiment_score)
            .bind(article.category.as_str())
            .bind(serde_json::to_string(&article.keywords)?)
            .bind(ts_to_db(article.fetched_at))
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(
            "Merged {} articles, {} new",
            articles.len(),
            inserted
        );
        Ok(inserted)
    }

    /// Cached articles matching the filter, newest first.
    pub async fn articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let cutoff = ts_to_db(Utc::now() - Duration::days(filter.days));

        let mut sql = format!(
            "SELECT {} FROM gold_news WHERE published_at >= ?",
            ARTICLE_COLUMNS
        );
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if filter.min_sentiment.is_some() {
            sql.push_str(" AND sentiment_score >= ?");
        }
        sql.push_str(" ORDER BY published_at DESC");

        let mut query = sqlx::query_as::<_, ArticleRow>(&sql).bind(cutoff);
        if let Some(category) = filter.category {
            query = query.bind(category.as_str());
        }
        if let Some(min_sentiment) = filter.min_sentiment {
            query = query.bind(min_sentiment);
        }

        let rows = query.fetch_all(self.pool()).await?;
        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    /// Most recent headlines, optionally restricted to one category.
    pub async fn recent_headlines(
        &self,
        limit: i64,
        category: Option<ArticleCategory>,
    ) -> Result<Vec<Article>> {
        let mut sql = format!("SELECT {} FROM gold_news", ARTICLE_COLUMNS);
        if category.is_some() {
            sql.push_str(" WHERE category = ?");
        }
        sql.push_str(" ORDER BY published_at DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, ArticleRow>(&sql);
        if let Some(category) = category {
            query = query.bind(category.as_str());
        }
        let rows = query.bind(limit).fetch_all(self.pool()).await?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    /// Keyword search over title, summary and extracted keywords.
    pub async fn search_articles(
        &self,
        keyword: &str,
        days: i64,
        limit: i64,
    ) -> Result<Vec<Article>> {
        let cutoff = ts_to_db(Utc::now() - Duration::days(days));
        let pattern = format!("%{}%", keyword);

        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {} FROM gold_news
             WHERE (title LIKE ? OR summary LIKE ? OR keywords LIKE ?)
               AND published_at >= ?
             ORDER BY published_at DESC
             LIMIT ?",
            ARTICLE_COLUMNS
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(cutoff)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    /// Aggregate counts over the cached news.
    pub async fn news_summary(&self, days: i64) -> Result<NewsSummary> {
        let cutoff = ts_to_db(Utc::now() - Duration::days(days));

        let (total_articles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM gold_news")
            .fetch_one(self.pool())
            .await?;

        let (recent_articles, average_sentiment): (i64, Option<f64>) = sqlx::query_as(
            "SELECT COUNT(*), AVG(sentiment_score) FROM gold_news WHERE published_at >= ?",
        )
        .bind(&cutoff)
        .fetch_one(self.pool())
        .await?;

        let categories: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM gold_news
             WHERE published_at >= ?
             GROUP BY category
             ORDER BY COUNT(*) DESC",
        )
        .bind(&cutoff)
        .fetch_all(self.pool())
        .await?;

        let top_publishers: Vec<(String, i64)> = sqlx::query_as(
            "SELECT publisher, COUNT(*) FROM gold_news
             WHERE published_at >= ?
             GROUP BY publisher
             ORDER BY COUNT(*) DESC
             LIMIT 5",
        )
        .bind(&cutoff)
        .fetch_all(self.pool())
        .await?;

        Ok(NewsSummary {
            total_articles,
            recent_articles,
            days,
            average_sentiment: average_sentiment.unwrap_or(0.0),
            categories,
            top_publishers,
        })
    }
}
