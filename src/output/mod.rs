//! Output module for writing crawl results
//!
//! A finished crawl is written as a JSON sitemap: an object mapping each
//! processed page to the same-host pages it links to.

mod sitemap;

pub use sitemap::{sitemap_path, write_sitemap};

/// Result type for output operations
pub type OutputResult<T> = std::result::Result<T, crate::OutputError>;
