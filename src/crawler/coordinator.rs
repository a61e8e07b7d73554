//! Crawler coordinator - the frontier side of the pipeline
//!
//! The coordinator is the only task that touches the frontier. It loops over
//! three events until nothing is queued and nothing is in flight:
//! - A failed page arrives from the fetch pool
//! - A parsed page arrives from the parse pool
//! - The dispatch channel has room and a URL is queued
//!
//! Dispatch waits for channel room inside the same select as the result
//! channels, so a full dispatch channel never stops results from draining.

use crate::crawler::frontier::Frontier;
use crate::crawler::page::{CrawlResult, Page};
use crate::CrawlError;
use tokio::sync::mpsc;
use tracing::{Instrument, Span};
use url::Url;

pub struct Coordinator {
    frontier: Frontier,
    dispatch_tx: mpsc::Sender<Page>,
    parsed_rx: mpsc::Receiver<Page>,
    error_rx: mpsc::Receiver<Page>,
    span: Span,
}

impl Coordinator {
    /// Creates a coordinator with `seed` queued
    ///
    /// # Arguments
    ///
    /// * `seed` - The crawl's starting URL
    /// * `dispatch_tx` - Sends URLs to the fetch pool
    /// * `parsed_rx` - Receives parsed pages from the parse pool
    /// * `error_rx` - Receives pages whose fetch failed
    /// * `span` - Span the coordinator logs through
    pub fn new(
        seed: Url,
        dispatch_tx: mpsc::Sender<Page>,
        parsed_rx: mpsc::Receiver<Page>,
        error_rx: mpsc::Receiver<Page>,
        span: Span,
    ) -> Result<Self, CrawlError> {
        Ok(Self {
            frontier: Frontier::new(seed)?,
            dispatch_tx,
            parsed_rx,
            error_rx,
            span,
        })
    }

    /// Runs the crawl loop to completion
    ///
    /// Consuming the coordinator drops the dispatch sender on return, which
    /// lets the worker pools drain and stop.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Every discovered URL was processed or failed
    /// * `Err(CrawlError)` - A state invariant was broken or a pool went away
    ///   with pages still in flight
    pub async fn run(self) -> Result<CrawlResult, CrawlError> {
        let span = self.span.clone();
        self.work().instrument(span).await
    }

    async fn work(mut self) -> Result<CrawlResult, CrawlError> {
        tracing::debug!("coordinator started");

        while !self.frontier.is_finished() {
            tokio::select! {
                page = self.error_rx.recv() => {
                    let page = page.ok_or(CrawlError::ChannelClosed("fetch errors"))?;
                    self.frontier.record_failure(&page)?;
                    tracing::debug!(url = %page.url, "error");
                }

                page = self.parsed_rx.recv() => {
                    let page = page.ok_or(CrawlError::ChannelClosed("parsed pages"))?;
                    let url = page.url.clone();
                    let children = page.children.as_ref().map_or(0, Vec::len);
                    let queued = self.frontier.record_parsed(page)?;
                    tracing::info!(url = %url, children, queued, "processed");
                }

                permit = self.dispatch_tx.reserve(), if self.frontier.has_pending() => {
                    let permit = permit.map_err(|_| CrawlError::ChannelClosed("dispatch"))?;
                    if let Some(page) = self.frontier.dispatch_next()? {
                        tracing::debug!(url = %page.url, pending = self.frontier.pending(), "dispatch");
                        permit.send(page);
                    }
                }
            }
        }

        let tracked = self.frontier.tracked();
        let result = self.frontier.into_result();
        tracing::info!(
            tracked,
            processed = result.links.len(),
            errors = result.error_count,
            "crawl finished"
        );

        Ok(result)
    }
}
