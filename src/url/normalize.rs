use url::{Position, Url};

/// Canonicalizes an absolute URL into the string form used for deduplication
///
/// # Normalization Steps
///
/// 1. Lowercase the scheme and host
/// 2. Sort query parameters by key (values of a repeated key keep their order)
/// 3. Remove dot segments (`.` and `..`)
/// 4. Collapse duplicate slashes in the path
/// 5. Remove an empty query separator (trailing `?`)
/// 6. Remove the fragment
/// 7. Remove a trailing slash, including the lone `/` of a root path
///
/// Because of step 7 the canonical form of a root URL has no path at all
/// (`https://example.com`), which `Url` itself cannot represent. That is why
/// this returns a `String`.
///
/// # Examples
///
/// ```
/// use hostcrawl::url::canonicalize;
/// use url::Url;
///
/// let url = Url::parse("HTTP://Example.COM//a/./b/?z=1&a=2#top").unwrap();
/// assert_eq!(canonicalize(&url), "http://example.com/a/b?a=2&z=1");
/// ```
pub fn canonicalize(url: &Url) -> String {
    let mut url = url.clone();

    // The url crate already lowercases special schemes and their hosts; this
    // covers opaque hosts of other schemes.
    if let Some(lowered) = url.host_str().map(str::to_lowercase) {
        if url.host_str() != Some(lowered.as_str()) {
            if let Err(e) = url.set_host(Some(&lowered)) {
                tracing::trace!(host = %lowered, error = %e, "keeping host as written");
            }
        }
    }

    if let Some(query) = url.query() {
        if query.is_empty() {
            url.set_query(None);
        } else {
            let params = sorted_query_params(&url);
            if params.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(params);
            }
        }
    }

    url.set_fragment(None);

    if !url.cannot_be_a_base() {
        let normalized = normalize_path(url.path());
        url.set_path(&normalized);
    }

    if url.path() == "/" {
        format!(
            "{}{}",
            &url[..Position::BeforePath],
            &url[Position::AfterPath..]
        )
    } else {
        url.to_string()
    }
}

/// Normalizes a URL path by removing dot segments, duplicate slashes and
/// the trailing slash
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Returns the query parameters sorted by key
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    // Stable sort keeps repeated keys in document order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}
