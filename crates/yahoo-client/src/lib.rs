//! Yahoo Finance client: v8 chart endpoint for OHLCV bars, v1 search
//! endpoint for news. All calls go through a shared sliding-window rate
//! limiter so concurrent fetches stay inside the provider budget.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_core::{Bar, BarInterval, IngestError, MarketDataProvider, NewsProvider, RawArticle};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
/// Shared across clones of the client, so parallel fetch tasks contend on
/// one budget instead of sleeping independently.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let wait_until = ts.front().unwrap().checked_add(self.window).unwrap();
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Yahoo API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Client configuration, passed in by the caller. No environment reads here.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub requests_per_minute: usize,
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new(config: YahooConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(
                config.requests_per_minute,
                Duration::from_secs(60),
            ),
        }
    }

    /// Send a request through the rate limiter. Transport failures and
    /// non-success statuses surface as transient upstream errors; the retry
    /// controller upstack decides whether to re-attempt.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, IngestError> {
        self.rate_limiter.acquire().await;

        let response = builder
            .send()
            .await
            .map_err(|e| IngestError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IngestError::Upstream(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: BarInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, IngestError> {
        let url = format!("{}/v8/finance/chart/{}", BASE_URL, symbol);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", interval.label().to_string()),
                ("includePrePost", "true".to_string()),
            ]))
            .await?;

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Upstream(e.to_string()))?;

        bars_from_chart(chart, Utc::now())
    }
}

#[async_trait]
impl NewsProvider for YahooClient {
    async fn fetch_news(
        &self,
        symbol: &str,
        max_results: u32,
    ) -> Result<Vec<RawArticle>, IngestError> {
        let url = format!("{}/v1/finance/search", BASE_URL);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("q", symbol.to_string()),
                ("newsCount", max_results.to_string()),
                ("quotesCount", "0".to_string()),
            ]))
            .await?;

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Upstream(e.to_string()))?;

        Ok(search
            .news
            .into_iter()
            .take(max_results as usize)
            .map(NewsItem::into_raw)
            .collect())
    }
}

/// Flatten a chart payload into bars. Slots where the provider sent null
/// for any OHLC field are skipped; the rest of the batch proceeds.
fn bars_from_chart(chart: ChartResponse, fetched_at: DateTime<Utc>) -> Result<Vec<Bar>, IngestError> {
    if let Some(err) = chart.chart.error {
        return Err(IngestError::Upstream(err.to_string()));
    }

    let result = match chart.chart.result.and_then(|mut r| {
        if r.is_empty() {
            None
        } else {
            Some(r.remove(0))
        }
    }) {
        Some(r) => r,
        None => return Ok(Vec::new()),
    };

    let quote = match result.indicators.quote.into_iter().next() {
        Some(q) => q,
        None => return Ok(Vec::new()),
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let slot = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        );

        let (open, high, low, close) = match slot {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let timestamp = match DateTime::from_timestamp(ts, 0) {
            Some(t) => t,
            None => {
                skipped += 1;
                continue;
            }
        };

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            fetched_at,
        });
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} chart slots with null fields", skipped);
    }

    Ok(bars)
}

// Chart response structures

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

// News response structures. The provider ships two shapes for the same
// feed: a flat legacy item and a nested `content` item. Both are modeled
// here and resolved in `into_raw`.

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsItem {
    // Legacy flat shape
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default, rename = "providerPublishTime")]
    provider_publish_time: Option<i64>,

    // Nested shape
    #[serde(default)]
    content: Option<NewsContent>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsContent {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(default, rename = "clickThroughUrl")]
    click_through_url: Option<UrlRef>,
    #[serde(default, rename = "canonicalUrl")]
    canonical_url: Option<UrlRef>,
    #[serde(default)]
    provider: Option<ProviderRef>,
}

#[derive(Debug, Default, Deserialize)]
struct UrlRef {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderRef {
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
}

impl NewsItem {
    /// Resolve whichever schema variant the provider sent into one raw
    /// article. Missing fields come out empty / `None`; the filtering step
    /// of the news cycle decides what is usable.
    fn into_raw(self) -> RawArticle {
        let content = self.content.unwrap_or_default();

        let title = content.title.or(self.title).unwrap_or_default();

        let summary = content
            .summary
            .or(content.description)
            .or(self.summary)
            .unwrap_or_default();

        let link = content
            .click_through_url
            .and_then(|u| u.url)
            .or_else(|| content.canonical_url.and_then(|u| u.url))
            .or(self.link)
            .unwrap_or_default();

        let publisher = content
            .provider
            .and_then(|p| p.display_name)
            .or(self.publisher)
            .unwrap_or_else(|| "Unknown".to_string());

        let published_at = content
            .pub_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                self.provider_publish_time
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
            });

        RawArticle {
            title,
            summary,
            link,
            publisher,
            published_at,
        }
    }
}
