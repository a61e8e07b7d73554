//! JSON sitemap generation

use crate::crawler::CrawlResult;
use crate::output::OutputResult;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Returns where the sitemap for `seed` is written: `<dir>/<host>_sitemap.json`
///
/// The port is not part of the file name.
pub fn sitemap_path(dir: &Path, seed: &Url) -> PathBuf {
    let host = seed.host_str().unwrap_or("unknown");
    dir.join(format!("{}_sitemap.json", host))
}

/// Writes the link map of `result` as JSON
///
/// Keys are sorted, so two crawls of an unchanged site produce identical
/// files. The error count is not part of the file.
///
/// # Arguments
///
/// * `result` - The finished crawl
/// * `dir` - Output directory; created if missing
/// * `seed` - The crawl's seed, naming the file
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Serialization or I/O failure
pub fn write_sitemap(result: &CrawlResult, dir: &Path, seed: &Url) -> OutputResult<PathBuf> {
    let json = serde_json::to_vec(&result.links)?;

    fs::create_dir_all(dir)?;
    let path = sitemap_path(dir, seed);
    fs::write(&path, json)?;

    tracing::debug!(path = %path.display(), pages = result.links.len(), "sitemap written");

    Ok(path)
}
