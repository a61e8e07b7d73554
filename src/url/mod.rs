//! URL handling module
//!
//! This module provides seed parsing, URL canonicalization, the scheme-less
//! state key and the same-host scope check.

mod normalize;
mod scope;

use crate::{UrlError, UrlResult};
use url::{Position, Url};

// Re-export main functions
pub use normalize::canonicalize;
pub use scope::{is_in_scope, path_extension};

/// Parses the seed address given on the command line
///
/// - A seed without a scheme defaults to `https` (a warning is logged)
/// - A bare host such as `example.com` or `example.com/docs` is read as a
///   host, never as a relative path
/// - Only `http` and `https` seeds with a host are accepted
///
/// # Examples
///
/// ```
/// use hostcrawl::url::parse_seed;
///
/// let seed = parse_seed("example.com").unwrap();
/// assert_eq!(seed.as_str(), "https://example.com/");
/// ```
pub fn parse_seed(input: &str) -> UrlResult<Url> {
    let input = input.trim();

    let url = if input.contains("://") {
        Url::parse(input)?
    } else if let Some(rest) = input.strip_prefix("//") {
        tracing::warn!("no scheme specified for seed '{}', defaulting to https", input);
        Url::parse(&format!("https://{}", rest))?
    } else {
        tracing::warn!("no scheme specified for seed '{}', defaulting to https", input);
        Url::parse(&format!("https://{}", input))?
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost(input.to_string())),
    }
}

/// Returns the key a URL is tracked under: everything after the scheme
///
/// `http://example.com/a` and `https://example.com/a` share the key
/// `://example.com/a`, so a page reachable through both schemes is tracked
/// once.
pub fn state_key(url: &Url) -> String {
    url[Position::AfterScheme..].to_string()
}
