use crate::config::parser::deserialize_duration;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default capacity of every pipeline channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1 << 10;

/// Fetch workers spawned per unit of CPU parallelism; fetching is I/O-bound
const FETCH_WORKERS_PER_CPU: usize = 32;

/// Main configuration structure
///
/// Every section and key is optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Per-request timeout, written as a duration string ("10s", "1m30s")
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// Maximum requests per minute across all fetch workers (0 = unlimited)
    #[serde(rename = "rate-limit")]
    pub rate_limit: u32,

    /// Number of concurrent fetch workers
    #[serde(rename = "fetch-workers")]
    pub fetch_workers: usize,

    /// Number of concurrent parse workers
    #[serde(rename = "parse-workers")]
    pub parse_workers: usize,

    /// Capacity of each channel between pipeline stages
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        let cpus = available_parallelism();
        Self {
            timeout: Duration::from_secs(10),
            rate_limit: 0,
            fetch_workers: cpus * FETCH_WORKERS_PER_CPU,
            parse_workers: cpus,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the sitemap file is written to
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
