//! HTML parser for extracting same-host links
//!
//! Parsing runs in three steps:
//! - Extraction: collect link references from whitelisted tag attributes
//! - Normalization: resolve each reference against the page and canonicalize it
//! - Filtering: keep unseen, in-scope URLs on the seed's host

use crate::crawler::page::Page;
use crate::url::{canonicalize, is_in_scope};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{Instrument, Span};
use url::Url;

/// Tags that carry links, with their link attributes in order of preference
const LINK_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("head", &["profile"]),
    ("iframe", &["longdesc", "src"]),
    ("q", &["cite"]),
];

fn link_attributes(tag: &str) -> Option<&'static [&'static str]> {
    LINK_TAGS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, attrs)| *attrs)
}

/// Collects link references from start tags as the tokenizer emits them
#[derive(Default)]
struct ReferenceSink {
    references: Vec<String>,
}

impl ReferenceSink {
    fn collect(&mut self, tag: &Tag) {
        let Some(attributes) = link_attributes(&tag.name) else {
            return;
        };

        let value = attributes.iter().find_map(|wanted| {
            tag.attrs
                .iter()
                .find(|attr| &*attr.name.local == *wanted && !attr.value.is_empty())
        });

        if let Some(attr) = value {
            self.references.push(attr.value.to_string());
        }
    }
}

impl TokenSink for ReferenceSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        if tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }

        self.collect(&tag);

        if tag.self_closing {
            return TokenSinkResult::Continue;
        }

        // Without a tree builder the sink switches raw text states itself
        match &*tag.name {
            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
            "plaintext" => TokenSinkResult::Plaintext,
            _ => TokenSinkResult::Continue,
        }
    }
}

/// Extracts link references from HTML start tags, in document order
///
/// # Link Extraction Rules
///
/// | Tag | Attributes (first non-empty wins) |
/// |-----|-----------------------------------|
/// | `a` | `href` |
/// | `head` | `profile` |
/// | `iframe` | `longdesc`, `src` |
/// | `q` | `cite` |
///
/// Every other tag is ignored. Tags are read where they appear in the markup,
/// whether or not a browser would keep them there, and malformed markup never
/// fails the page: whatever references were recovered are returned. Markup
/// inside `script`, `style` and similar raw text elements is not scanned.
///
/// # Example
///
/// ```
/// use hostcrawl::crawler::extract_references;
///
/// let html = r#"<a href="/about">About</a><img src="/logo.png">"#;
/// assert_eq!(extract_references(html), vec!["/about".to_string()]);
/// ```
pub fn extract_references(html: &str) -> Vec<String> {
    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(ReferenceSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    tokenizer.sink.references
}

/// Resolves references against `base` and canonicalizes them
///
/// References that cannot be resolved into a URL are skipped. Order is
/// preserved.
pub fn normalize_references(base: &Url, references: &[String]) -> Vec<String> {
    references
        .iter()
        .filter_map(|reference| match base.join(reference) {
            Ok(resolved) => Some(canonicalize(&resolved)),
            Err(e) => {
                tracing::trace!(reference = %reference, error = %e, "skipping unresolvable reference");
                None
            }
        })
        .collect()
}

/// Link extraction bound to the crawl's seed
#[derive(Debug, Clone)]
pub struct LinkParser {
    seed: Url,
    seed_canonical: String,
}

impl LinkParser {
    pub fn new(seed: &Url) -> Self {
        Self {
            seed: seed.clone(),
            seed_canonical: canonicalize(seed),
        }
    }

    /// Extracts, normalizes and filters the links of a fetched page
    pub fn parse(&self, page_url: &Url, body: &[u8]) -> Vec<Url> {
        let html = String::from_utf8_lossy(body);
        let references = extract_references(&html);
        let normalized = normalize_references(page_url, &references);
        let children = self.filter(&normalized);

        tracing::debug!(
            url = %page_url,
            references = references.len(),
            normalized = normalized.len(),
            children = children.len(),
            "parse"
        );

        children
    }

    /// Keeps the canonical URLs that are unseen and in scope
    ///
    /// The seen-set starts with the seed, so a page linking back to the seed
    /// never lists it as a child. Duplicates within one page are collapsed.
    pub fn filter(&self, candidates: &[String]) -> Vec<Url> {
        let mut seen: HashSet<&str> = HashSet::from([self.seed_canonical.as_str()]);
        let mut children = Vec::new();

        for candidate in candidates {
            if seen.contains(candidate.as_str()) {
                continue;
            }

            match Url::parse(candidate) {
                Ok(url) if is_in_scope(&url, &self.seed) => {
                    seen.insert(candidate);
                    children.push(url);
                }
                _ => {}
            }
        }

        children
    }
}

/// One parse worker
///
/// The parsing itself runs on the blocking thread pool.
pub struct Parser {
    links: Arc<LinkParser>,
    inbox: Arc<Mutex<mpsc::Receiver<Page>>>,
    outbox: mpsc::Sender<Page>,
    span: Span,
}

impl Parser {
    /// Creates a worker that logs through `span`
    pub fn new(
        links: Arc<LinkParser>,
        inbox: Arc<Mutex<mpsc::Receiver<Page>>>,
        outbox: mpsc::Sender<Page>,
        span: Span,
    ) -> Self {
        Self {
            links,
            inbox,
            outbox,
            span,
        }
    }

    /// Runs the worker until the fetched-page channel closes or the
    /// coordinator stops listening
    pub async fn run(self) {
        let span = self.span.clone();
        self.work().instrument(span).await
    }

    async fn work(self) {
        loop {
            let next = self.inbox.lock().await.recv().await;
            let Some(mut page) = next else {
                break;
            };
            tracing::debug!(url = %page.url, "recv");

            let links = self.links.clone();
            let url = page.url.clone();
            let body = page.body.take().unwrap_or_default();
            let span = Span::current();

            let children = match tokio::task::spawn_blocking(move || {
                span.in_scope(|| links.parse(&url, &body))
            })
            .await
            {
                Ok(children) => children,
                Err(e) => {
                    tracing::error!(url = %page.url, error = %e, "parse task failed");
                    Vec::new()
                }
            };

            tracing::debug!(url = %page.url, children = children.len(), "send");
            page.children = Some(children);

            if self.outbox.send(page).await.is_err() {
                break;
            }
        }

        tracing::debug!("parser stopped");
    }
}
