use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data for one interval slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub fetched_at: DateTime<Utc>,
}

/// Bar interval tracked by the cache. Each interval is cached in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarInterval {
    M15,
    M30,
}

impl BarInterval {
    pub const ALL: [BarInterval; 2] = [BarInterval::M15, BarInterval::M30];

    /// Distance between consecutive bars of this interval.
    pub fn step(&self) -> Duration {
        match self {
            BarInterval::M15 => Duration::minutes(15),
            BarInterval::M30 => Duration::minutes(30),
        }
    }

    /// Label used both in the upstream API and in table names.
    pub fn label(&self) -> &'static str {
        match self {
            BarInterval::M15 => "15m",
            BarInterval::M30 => "30m",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            BarInterval::M15 => "gold_bars_15m",
            BarInterval::M30 => "gold_bars_30m",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "15m" => Some(BarInterval::M15),
            "30m" => Some(BarInterval::M30),
            _ => None,
        }
    }
}

/// Article as returned by a news provider, before enrichment.
/// Field presence is not guaranteed; the filtering step validates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub publisher: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Enriched article as persisted in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Deterministic fingerprint of title + summary + link; the dedup key.
    pub content_hash: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    pub publisher: String,
    pub symbol: String,
    pub published_at: DateTime<Utc>,
    pub sentiment_score: f64,
    pub category: ArticleCategory,
    pub keywords: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Coarse article category assigned by the pluggable heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleCategory {
    MonetaryPolicy,
    SupplyDemand,
    MarketMovement,
    Geopolitical,
    EconomicData,
    General,
}

impl ArticleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleCategory::MonetaryPolicy => "monetary_policy",
            ArticleCategory::SupplyDemand => "supply_demand",
            ArticleCategory::MarketMovement => "market_movement",
            ArticleCategory::Geopolitical => "geopolitical",
            ArticleCategory::EconomicData => "economic_data",
            ArticleCategory::General => "general",
        }
    }

    /// Unknown labels map to General so that old rows stay readable.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "monetary_policy" => ArticleCategory::MonetaryPolicy,
            "supply_demand" => ArticleCategory::SupplyDemand,
            "market_movement" => ArticleCategory::MarketMovement,
            "geopolitical" => ArticleCategory::Geopolitical,
            "economic_data" => ArticleCategory::EconomicData,
            _ => ArticleCategory::General,
        }
    }
}

/// Audit record for one orchestration unit. Append-only, never read back
/// for correctness decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub feed_id: String,
    pub attempted_at: DateTime<Utc>,
    pub items_count: i64,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

impl FetchOutcome {
    pub fn success(feed_id: impl Into<String>, items_count: i64) -> Self {
        Self {
            feed_id: feed_id.into(),
            attempted_at: Utc::now(),
            items_count,
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failure(feed_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            feed_id: feed_id.into(),
            attempted_at: Utc::now(),
            items_count: 0,
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_labels_round_trip() {
        for interval in BarInterval::ALL {
            assert_eq!(BarInterval::from_label(interval.label()), Some(interval));
        }
        assert_eq!(BarInterval::from_label("1h"), None);
    }

    #[test]
    fn category_round_trip() {
        let categories = [
            ArticleCategory::MonetaryPolicy,
            ArticleCategory::SupplyDemand,
            ArticleCategory::MarketMovement,
            ArticleCategory::Geopolitical,
            ArticleCategory::EconomicData,
            ArticleCategory::General,
        ];
        for category in categories {
            assert_eq!(ArticleCategory::from_str_lossy(category.as_str()), category);
        }
        assert_eq!(
            ArticleCategory::from_str_lossy("unheard_of"),
            ArticleCategory::General
        );
    }
}
