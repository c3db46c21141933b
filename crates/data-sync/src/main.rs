//! data-sync: incremental fetch of gold price bars and news into the local
//! SQLite cache.
//!
//! Usage:
//!   cargo run -p data-sync                        # sync prices + news
//!   cargo run -p data-sync -- --days 30           # widen the price window
//!   cargo run -p data-sync -- --news-only
//!   cargo run -p data-sync -- --prices-only
//!   cargo run -p data-sync -- --synthetic         # mock providers, no network
//!   cargo run -p data-sync -- --summary           # print cache summary only
//!   cargo run -p data-sync -- --headlines 10      # print recent headlines and exit
//!   cargo run -p data-sync -- --search inflation  # search cached news and exit
//!   cargo run -p data-sync -- --brief             # print the LLM brief after syncing

use anyhow::Result;
use chrono::{Duration, Utc};
use feed_ingest::{CycleReport, NewsIngestor, PriceIngestor, SyncConfig, SyntheticProvider};
use ingest_core::{BarInterval, MarketDataProvider, NewsProvider};
use market_brief::{render_market_brief, BriefOptions};
use market_cache::{ArticleFilter, CacheDb};
use sentiment_heuristics::KeywordHeuristics;
use std::sync::Arc;
use yahoo_client::{YahooClient, YahooConfig};

fn config_from_env() -> SyncConfig {
    let mut cfg = SyncConfig::default();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        cfg.database_url = url;
    }
    if let Ok(symbol) = std::env::var("GOLD_SYMBOL") {
        cfg.symbol = symbol;
    }
    if let Ok(symbols) = std::env::var("NEWS_SYMBOLS") {
        let parsed: Vec<String> = symbols
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !parsed.is_empty() {
            cfg.news_symbols = parsed;
        }
    }
    if let Some(days) = std::env::var("FETCH_DAYS").ok().and_then(|v| v.parse().ok()) {
        cfg.fetch_days = days;
    }
    if let Some(n) = std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()) {
        cfg.max_retries = n;
    }
    if let Some(n) = std::env::var("MAX_ARTICLES_PER_SYMBOL")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        cfg.max_articles_per_symbol = n;
    }
    if let Some(n) = std::env::var("REQUESTS_PER_MINUTE")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        cfg.requests_per_minute = n;
    }

    cfg
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "data_sync=info,feed_ingest=info,market_cache=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let synthetic = args.iter().any(|a| a == "--synthetic");
    let news_only = args.iter().any(|a| a == "--news-only");
    let prices_only = args.iter().any(|a| a == "--prices-only");
    let summary_only = args.iter().any(|a| a == "--summary");
    let print_brief = args.iter().any(|a| a == "--brief");

    let mut cfg = config_from_env();

    if let Some(days) = args
        .iter()
        .position(|a| a == "--days")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
    {
        cfg.fetch_days = days;
    }
    if let Some(db) = args
        .iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
    {
        cfg.database_url = format!("sqlite:{}", db);
    }

    let db = CacheDb::new(&cfg.database_url).await?;

    if summary_only {
        print_cache_summary(&db, &cfg).await?;
        return Ok(());
    }

    if let Some(limit) = args
        .iter()
        .position(|a| a == "--headlines")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
    {
        for article in db.recent_headlines(limit, None).await? {
            println!(
                "[{}] {} | {} | sentiment {:+.2}",
                article.publisher,
                article.title,
                article.published_at.format("%Y-%m-%d %H:%M"),
                article.sentiment_score
            );
        }
        return Ok(());
    }

    if let Some(keyword) = args
        .iter()
        .position(|a| a == "--search")
        .and_then(|i| args.get(i + 1))
    {
        for article in db.search_articles(keyword, 30, 20).await? {
            println!(
                "[{}] {} | {}",
                article.publisher, article.title, article.link
            );
        }
        return Ok(());
    }

    let (price_provider, news_provider): (Arc<dyn MarketDataProvider>, Arc<dyn NewsProvider>) =
        if synthetic {
            tracing::info!("Using synthetic providers (no network calls)");
            let provider = SyntheticProvider::default();
            (Arc::new(provider), Arc::new(provider))
        } else {
            let client = YahooClient::new(YahooConfig {
                requests_per_minute: cfg.requests_per_minute,
                ..Default::default()
            });
            (Arc::new(client.clone()), Arc::new(client))
        };

    let end = Utc::now();
    let start = end - Duration::days(cfg.fetch_days);
    tracing::info!(
        "Syncing {} from {} to {} ({} news symbols)",
        cfg.symbol,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        cfg.news_symbols.len()
    );

    let price_task = async {
        if news_only {
            return Ok::<_, anyhow::Error>(Vec::new());
        }
        let ingestor = PriceIngestor::new(price_provider, db.clone(), &cfg);
        let mut reports = Vec::new();
        for interval in &cfg.intervals {
            reports.push(ingestor.run_cycle(*interval, start, end).await?);
        }
        Ok(reports)
    };

    let news_task = async {
        if prices_only {
            return Ok::<_, anyhow::Error>(None);
        }
        let ingestor = NewsIngestor::new(
            news_provider,
            Arc::new(KeywordHeuristics::new()),
            db.clone(),
            &cfg,
        );
        Ok(Some(ingestor.run_cycle().await?))
    };

    // Different feeds touch disjoint tables, so the cycles run concurrently.
    let (price_reports, news_report) = tokio::join!(price_task, news_task);
    let price_reports = price_reports?;
    let news_report = news_report?;

    for report in &price_reports {
        log_report(report);
    }
    if let Some(report) = &news_report {
        log_report(report);
    }

    print_cache_summary(&db, &cfg).await?;

    if print_brief {
        let interval = cfg.intervals.first().copied().unwrap_or(BarInterval::M15);
        let bars = db
            .bars_in_range(interval, end - Duration::hours(24), end)
            .await?;
        let articles = db.articles(&ArticleFilter::default()).await?;
        println!(
            "{}",
            render_market_brief(interval.label(), &bars, &articles, &BriefOptions::default())
        );
    }

    Ok(())
}

fn log_report(report: &CycleReport) {
    tracing::info!(
        "{}: {} new rows across {} units ({} failed)",
        report.feed,
        report.new_rows(),
        report.units.len(),
        report.failed_units()
    );
    for unit in &report.units {
        if let Some(error) = &unit.error {
            tracing::warn!("  {} failed: {}", unit.unit, error);
        }
    }
}

async fn print_cache_summary(db: &CacheDb, cfg: &SyncConfig) -> Result<()> {
    println!("\n=== GOLD CACHE SUMMARY ===");

    for interval in &cfg.intervals {
        match db.interval_summary(*interval).await? {
            Some(summary) => println!(
                "{}: {} bars, {} .. {}, latest close ${:.2}",
                interval.label(),
                summary.records,
                summary.first.format("%Y-%m-%d %H:%M"),
                summary.last.format("%Y-%m-%d %H:%M"),
                summary.latest_close
            ),
            None => println!("{}: no data cached", interval.label()),
        }
    }

    let news = db.news_summary(7).await?;
    println!(
        "news: {} articles total, {} in the last {} days, avg sentiment {:.3}",
        news.total_articles, news.recent_articles, news.days, news.average_sentiment
    );
    for (category, count) in &news.categories {
        println!("  {}: {}", category, count);
    }

    Ok(())
}
