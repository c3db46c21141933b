use anyhow::Result;
use chrono::{DateTime, Utc};
use ingest_core::{Article, FetchOutcome, IngestError, NewsProvider, RawArticle, SentimentModel};
use market_cache::CacheDb;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::report::{CycleReport, UnitReport};
use crate::retry::with_retry;

/// Deterministic content fingerprint over the article's identifying
/// fields. This is the dedup key enforced by the store's unique constraint.
pub fn fingerprint(title: &str, summary: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(summary.as_bytes());
    hasher.update(link.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate a raw article and apply the pluggable heuristics. Articles
/// with a missing title, link or publish timestamp are rejected; the
/// caller logs and drops them without aborting the batch.
pub fn enrich(
    raw: RawArticle,
    symbol: &str,
    model: &dyn SentimentModel,
    fetched_at: DateTime<Utc>,
) -> Result<Article, IngestError> {
    if raw.title.trim().is_empty() {
        return Err(IngestError::Malformed("article missing title".into()));
    }
    if raw.link.trim().is_empty() {
        return Err(IngestError::Malformed(format!(
            "article {:?} missing link",
            raw.title
        )));
    }
    let published_at = raw.published_at.ok_or_else(|| {
        IngestError::Malformed(format!("article {:?} missing publish timestamp", raw.title))
    })?;

    let text = format!("{} {}", raw.title, raw.summary);

    Ok(Article {
        content_hash: fingerprint(&raw.title, &raw.summary, &raw.link),
        sentiment_score: model.score(&text),
        category: model.categorize(&text),
        keywords: model.keywords(&text),
        title: raw.title,
        summary: raw.summary,
        link: raw.link,
        publisher: raw.publisher,
        symbol: symbol.to_string(),
        published_at,
        fetched_at,
    })
}

/// Drives one news fetch cycle:
/// IDLE → FETCHING → FILTERING → MERGING → DONE, per tracked symbol.
///
/// News is not windowed: the whole candidate set is fetched every cycle
/// and dedup happens on merge via the fingerprint key. Each symbol is a
/// unit — its failure never blanks out the other symbols' results.
pub struct NewsIngestor {
    provider: Arc<dyn NewsProvider>,
    model: Arc<dyn SentimentModel>,
    db: CacheDb,
    symbols: Vec<String>,
    max_articles_per_symbol: u32,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl NewsIngestor {
    pub fn new(
        provider: Arc<dyn NewsProvider>,
        model: Arc<dyn SentimentModel>,
        db: CacheDb,
        config: &SyncConfig,
    ) -> Self {
        Self {
            provider,
            model,
            db,
            symbols: config.news_symbols.clone(),
            max_articles_per_symbol: config.max_articles_per_symbol,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        }
    }

    /// Run one cycle over all tracked symbols. Returns Err only when the
    /// store itself is unusable.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::new("news");

        for symbol in &self.symbols {
            let feed_id = format!("news:{}", symbol);

            match self.ingest_symbol(symbol).await {
                Ok((fetched, new_rows)) => {
                    tracing::info!(
                        "{}: {} new articles ({} fetched)",
                        feed_id,
                        new_rows,
                        fetched
                    );
                    self.db
                        .record_outcome(&FetchOutcome::success(&feed_id, new_rows as i64))
                        .await?;
                    report.units.push(UnitReport {
                        unit: feed_id,
                        fetched,
                        new_rows,
                        succeeded: true,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!("{}: unit failed: {}", feed_id, err);
                    self.db
                        .record_outcome(&FetchOutcome::failure(&feed_id, err.to_string()))
                        .await?;
                    report.units.push(UnitReport {
                        unit: feed_id,
                        fetched: 0,
                        new_rows: 0,
                        succeeded: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn ingest_symbol(&self, symbol: &str) -> Result<(usize, u64), IngestError> {
        let raw = with_retry(
            &format!("news:{}", symbol),
            self.max_retries,
            self.retry_base_delay,
            || self.provider.fetch_news(symbol, self.max_articles_per_symbol),
        )
        .await?;

        let fetched = raw.len();
        let fetched_at = Utc::now();

        let mut articles = Vec::with_capacity(fetched);
        for item in raw {
            match enrich(item, symbol, self.model.as_ref(), fetched_at) {
                Ok(article) => articles.push(article),
                Err(err) => tracing::warn!("news:{}: skipping article: {}", symbol, err),
            }
        }

        let new_rows = self
            .db
            .insert_articles(&articles)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;

        Ok((fetched, new_rows))
    }
}
