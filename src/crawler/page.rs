//! Work items and crawl output

use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

/// A unit of work in flight through the pipeline
///
/// A page is owned by exactly one stage at a time and moves between stages
/// by channel send. The fetch stage fills `body`, the parse stage fills
/// `children`.
#[derive(Debug)]
pub struct Page {
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub children: Option<Vec<Url>>,
}

impl Page {
    /// Creates a page carrying only its URL
    pub fn new(url: Url) -> Self {
        Self {
            url,
            body: None,
            children: None,
        }
    }
}

/// The output of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    /// Page URL to the same-host URLs it links to, for processed pages only
    pub links: BTreeMap<String, Vec<String>>,

    /// Number of pages whose fetch failed
    pub error_count: usize,
}

impl CrawlResult {
    /// Returns true if no page was processed successfully
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
