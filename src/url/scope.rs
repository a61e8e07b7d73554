use percent_encoding::percent_decode_str;
use url::Url;

/// Path extensions a crawlable page may have
const ALLOWED_EXTENSIONS: &[&str] = &["", ".html"];

/// Checks whether `url` is in scope for a crawl seeded at `seed`
///
/// A URL is in scope when:
/// - its hostname exactly equals the seed's hostname (subdomains are not followed)
/// - its scheme is `http` or `https`
/// - its path has no extension, or the `.html` extension
///
/// # Examples
///
/// ```
/// use hostcrawl::url::is_in_scope;
/// use url::Url;
///
/// let seed = Url::parse("https://example.com").unwrap();
/// assert!(is_in_scope(&Url::parse("http://example.com/about").unwrap(), &seed));
/// assert!(!is_in_scope(&Url::parse("https://blog.example.com/").unwrap(), &seed));
/// ```
pub fn is_in_scope(url: &Url, seed: &Url) -> bool {
    url.host_str() == seed.host_str()
        && matches!(url.scheme(), "http" | "https")
        && ALLOWED_EXTENSIONS.contains(&path_extension(url.path()).as_str())
}

/// Returns the extension of the last segment of the decoded path, including
/// the dot
///
/// The path is percent-decoded first, so `/file%2Epdf` has the extension
/// `.pdf`. An empty string means the segment has no dot.
pub fn path_extension(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let last = match decoded.rfind('/') {
        Some(idx) => &decoded[idx + 1..],
        None => &decoded[..],
    };
    match last.rfind('.') {
        Some(idx) => last[idx..].to_string(),
        None => String::new(),
    }
}
