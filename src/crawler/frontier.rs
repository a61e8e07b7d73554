//! Crawl frontier: pending queue, URL state table and the accumulating result
//!
//! The frontier is owned by the coordinator alone. Every mutation goes
//! through [`StateTable::set`], so the counters and the queue cannot drift
//! from the states.

use crate::crawler::page::{CrawlResult, Page};
use crate::state::{Counters, StateTable, UrlState};
use crate::CrawlError;
use std::collections::{BTreeMap, VecDeque};
use url::Url;

#[derive(Debug)]
pub struct Frontier {
    /// Discovered URLs waiting for dispatch, in discovery order
    queue: VecDeque<Url>,

    table: StateTable,

    links: BTreeMap<String, Vec<String>>,
}

impl Frontier {
    /// Creates a frontier with `seed` as its only queued URL
    pub fn new(seed: Url) -> Result<Self, CrawlError> {
        let mut frontier = Self {
            queue: VecDeque::new(),
            table: StateTable::new(),
            links: BTreeMap::new(),
        };
        frontier.enqueue(seed)?;
        Ok(frontier)
    }

    fn enqueue(&mut self, url: Url) -> Result<(), CrawlError> {
        self.table.set(&url, UrlState::Queued)?;
        self.queue.push_back(url);
        Ok(())
    }

    /// Removes the front of the queue and marks it `processing`
    ///
    /// Returns `None` when nothing is queued.
    pub fn dispatch_next(&mut self) -> Result<Option<Page>, CrawlError> {
        let Some(url) = self.queue.pop_front() else {
            return Ok(None);
        };
        self.table.set(&url, UrlState::Processing)?;
        Ok(Some(Page::new(url)))
    }

    /// Marks a failed page as `error`
    pub fn record_failure(&mut self, page: &Page) -> Result<(), CrawlError> {
        self.table.set(&page.url, UrlState::Error)
    }

    /// Marks a parsed page `processed`, queues its untracked children and
    /// records its child list
    ///
    /// # Returns
    ///
    /// The number of children that were newly queued
    pub fn record_parsed(&mut self, page: Page) -> Result<usize, CrawlError> {
        self.table.set(&page.url, UrlState::Processed)?;

        let children = page.children.unwrap_or_default();
        let mut queued = 0;

        for child in &children {
            if self.table.get(child) == UrlState::Untracked {
                self.enqueue(child.clone())?;
                queued += 1;
            }
        }

        self.links.insert(
            page.url.to_string(),
            children.iter().map(Url::to_string).collect(),
        );

        Ok(queued)
    }

    /// True once nothing is queued and nothing is in flight
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() && self.table.counters().processing == 0
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of distinct URLs discovered so far, the seed included
    pub fn tracked(&self) -> usize {
        self.table.tracked()
    }

    pub fn counters(&self) -> Counters {
        self.table.counters()
    }

    pub fn state(&self, url: &Url) -> UrlState {
        self.table.get(url)
    }

    /// Finalizes the error count and hands over the result
    pub fn into_result(self) -> CrawlResult {
        CrawlResult {
            links: self.links,
            error_count: self.table.counters().errors,
        }
    }
}
