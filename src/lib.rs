//! hostcrawl: a single-host web crawler
//!
//! This crate crawls every page reachable from a seed URL on the same host and
//! produces a map from each page to the same-host pages it links to.
//!
//! The engine is a cyclic pipeline of three components connected by bounded
//! channels: a frontier coordinator, a pool of fetch workers and a pool of
//! parse workers. See [`crawler::crawl`] for the entry point.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Every variant is fatal to the crawl. Per-URL failures are reported as
/// [`FetchError`] inside the fetch pool and only ever counted.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: state::UrlState,
        to: state::UrlState,
    },

    #[error("Channel closed unexpectedly: {0}")]
    ChannelClosed(&'static str),
}

/// Per-URL fetch failures
///
/// These never escape the fetch pool: the page is forwarded to the
/// coordinator's error channel and counted.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Redirect to a different host from {url}")]
    RedirectPolicy { url: String },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] ::url::ParseError),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Errors raised while writing the crawl result
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize sitemap: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlResult, Page};
pub use state::UrlState;
pub use crate::url::{canonicalize, parse_seed, state_key};
