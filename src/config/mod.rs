//! Configuration module
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags are applied on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use hostcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("hostcrawl.toml")).unwrap();
//! println!("Rate limit: {} req/min", config.crawler.rate_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_CHANNEL_CAPACITY};

// Re-export parser functions
pub use parser::{load_config, parse_config, parse_duration};
pub use validation::validate;
