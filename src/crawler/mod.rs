//! Crawler module for single-host crawling
//!
//! This module contains the crawl pipeline:
//! - The coordinator owning the frontier and URL states
//! - A pool of fetch workers sharing one HTTP client and rate limit
//! - A pool of parse workers extracting same-host links
//!
//! The three stages are connected by bounded channels and the graph is
//! cyclic: coordinator to fetchers, fetchers to parsers or back to the
//! coordinator on failure, parsers back to the coordinator.

mod coordinator;
mod fetcher;
mod frontier;
mod page;
mod parser;
mod throttle;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, check_redirect, fetch_page, Fetcher, RedirectAction, MAX_REDIRECTS,
};
pub use frontier::Frontier;
pub use page::{CrawlResult, Page};
pub use parser::{extract_references, normalize_references, LinkParser, Parser};
pub use throttle::Throttle;

use crate::config::{validate, Config};
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use url::Url;

/// Crawls every same-host page reachable from `seed`
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP client and the shared rate limit
/// 2. Spawn the fetch and parse pools
/// 3. Run the coordinator until no URL is queued or in flight
/// 4. Wait for the pools to drain
///
/// # Arguments
///
/// * `seed` - Starting URL; its host bounds the crawl
/// * `config` - Pool sizes, timeout, rate limit and user agent
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Links of every processed page and the failure count
/// * `Err(CrawlError)` - Invalid configuration, client setup failure or a
///   broken pipeline invariant
///
/// # Example
///
/// ```no_run
/// use hostcrawl::{crawl, parse_seed, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let seed = parse_seed("https://example.com")?;
/// let result = crawl(seed, &Config::default()).await?;
/// println!("{} pages", result.links.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(seed: Url, config: &Config) -> Result<CrawlResult, CrawlError> {
    validate(config)?;

    let crawler = &config.crawler;
    tracing::info!(
        seed = %seed,
        timeout = ?crawler.timeout,
        rate = crawler.rate_limit,
        fetch_workers = crawler.fetch_workers,
        parse_workers = crawler.parse_workers,
        "starting crawl"
    );

    let (dispatch_tx, dispatch_rx) = mpsc::channel(crawler.channel_capacity);
    let (parse_tx, parse_rx) = mpsc::channel(crawler.channel_capacity);
    let (parsed_tx, parsed_rx) = mpsc::channel(crawler.channel_capacity);
    let (error_tx, error_rx) = mpsc::channel(crawler.channel_capacity);

    let client = build_http_client(crawler, &config.user_agent)?;
    let throttle = Throttle::per_minute(crawler.rate_limit).map(Arc::new);
    if let Some(throttle) = &throttle {
        tracing::info!(period = ?throttle.period(), "rate limit enabled");
    }
    let links = Arc::new(LinkParser::new(&seed));

    let dispatch_rx = Arc::new(Mutex::new(dispatch_rx));
    let parse_rx = Arc::new(Mutex::new(parse_rx));

    let mut workers = JoinSet::new();

    for id in 0..crawler.fetch_workers {
        let fetcher = Fetcher::new(
            client.clone(),
            throttle.clone(),
            dispatch_rx.clone(),
            parse_tx.clone(),
            error_tx.clone(),
            tracing::debug_span!("fetcher", worker = id),
        );
        workers.spawn(fetcher.run());
    }

    for id in 0..crawler.parse_workers {
        let parser = Parser::new(
            links.clone(),
            parse_rx.clone(),
            parsed_tx.clone(),
            tracing::debug_span!("parser", worker = id),
        );
        workers.spawn(parser.run());
    }

    // Only the workers hold these now, so each channel closes with its pool
    drop(parse_tx);
    drop(parsed_tx);
    drop(error_tx);

    let coordinator = Coordinator::new(
        seed,
        dispatch_tx,
        parsed_rx,
        error_rx,
        tracing::info_span!("coordinator"),
    )?;

    // On error the JoinSet is dropped here, which aborts the workers
    let result = coordinator.run().await?;

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "worker task failed");
        }
    }

    Ok(result)
}
