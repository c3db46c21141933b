use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{ArticleCategory, Bar, BarInterval, IngestError, RawArticle};

/// Trait for price bar providers. Implemented by the real upstream client
/// and by the synthetic provider used in tests and mock runs.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: BarInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, IngestError>;
}

/// Trait for news providers.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(
        &self,
        symbol: &str,
        max_results: u32,
    ) -> Result<Vec<RawArticle>, IngestError>;
}

/// Pluggable text heuristics applied during article enrichment.
/// Implementations must be pure functions of the input text.
pub trait SentimentModel: Send + Sync {
    /// Sentiment score in [-1.0, 1.0].
    fn score(&self, text: &str) -> f64;

    fn categorize(&self, text: &str) -> ArticleCategory;

    fn keywords(&self, text: &str) -> Vec<String>;
}
