use ingest_core::BarInterval;
use std::time::Duration;

/// Configuration for one sync run. Built once by the caller (the binary
/// reads it from the environment) and passed into the orchestrator
/// constructors; nothing in this crate reads ambient state.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_url: String,
    /// Symbol for the price feed.
    pub symbol: String,
    /// Symbols tracked by the news feed.
    pub news_symbols: Vec<String>,
    pub intervals: Vec<BarInterval>,
    /// Size of the requested price window, ending now.
    pub fetch_days: i64,
    pub max_articles_per_symbol: u32,
    /// Attempt budget per upstream call, including the first attempt.
    pub max_retries: u32,
    /// Base delay for linear retry backoff.
    pub retry_base_delay: Duration,
    /// Shared upstream rate-limit budget.
    pub requests_per_minute: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:gold.db".to_string(),
            symbol: "GC=F".to_string(),
            news_symbols: vec![
                "GC=F".to_string(),
                "GLD".to_string(),
                "GDX".to_string(),
                "NEM".to_string(),
            ],
            intervals: BarInterval::ALL.to_vec(),
            fetch_days: 14,
            max_articles_per_symbol: 50,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            requests_per_minute: 60,
        }
    }
}
