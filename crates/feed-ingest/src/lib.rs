//! Incremental ingestion for the two upstream feeds: price bars and news.
//! Resolves the missing delta against the cache, fetches only that delta
//! with bounded retries, and merges idempotently. Every unit (sub-window or
//! symbol batch) fails in isolation and leaves an audit outcome behind.

pub mod config;
pub mod gap;
pub mod news;
pub mod prices;
pub mod report;
pub mod retry;
pub mod synthetic;

pub use config::SyncConfig;
pub use gap::GapResolver;
pub use news::{enrich, fingerprint, NewsIngestor};
pub use prices::PriceIngestor;
pub use report::{CycleReport, UnitReport};
pub use retry::with_retry;
pub use synthetic::SyntheticProvider;
