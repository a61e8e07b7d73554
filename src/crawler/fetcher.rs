//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (user agent, timeout, redirect policy)
//! - GET requests with status checking
//! - The fetch worker loop feeding the parse pool
//!
//! Failed fetches are not retried: the page goes straight to the
//! coordinator's error channel.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::page::Page;
use crate::crawler::throttle::Throttle;
use crate::FetchError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{Instrument, Span};
use url::Url;

/// Number of redirects followed before the last response is used as-is
pub const MAX_REDIRECTS: usize = 3;

/// What to do with a redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectAction {
    /// Follow the redirect
    Follow,
    /// Stop and use the redirect response itself
    Stop,
    /// Fail the request
    Reject,
}

/// Raised through reqwest when a redirect leaves the original host
#[derive(Debug, Error)]
#[error("redirect to a different host: {target}")]
struct RedirectHostMismatch {
    target: String,
}

/// Decides whether to follow a redirect to `next`
///
/// `previous` holds every URL requested so far in the chain, the original
/// request first.
///
/// # Policy
///
/// | Condition | Action |
/// |-----------|--------|
/// | More than 3 redirects already followed | Stop, use the last response |
/// | Host or explicit port differs from the original request | Reject |
/// | Otherwise | Follow |
///
/// Too many redirects is not a failure by itself; leaving the host is.
pub fn check_redirect(previous: &[Url], next: &Url) -> RedirectAction {
    if previous.len() > MAX_REDIRECTS {
        return RedirectAction::Stop;
    }

    match previous.first() {
        Some(origin) if !same_host(origin, next) => RedirectAction::Reject,
        _ => RedirectAction::Follow,
    }
}

/// Compares the authority host and explicit port; default ports are not
/// written, so `http://host/` and `https://host/` are the same host
fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        let action = check_redirect(attempt.previous(), attempt.url());
        match action {
            RedirectAction::Follow => attempt.follow(),
            RedirectAction::Stop => attempt.stop(),
            RedirectAction::Reject => {
                let target = attempt.url().to_string();
                attempt.error(RedirectHostMismatch { target })
            }
        }
    })
}

/// Builds the HTTP client shared by all fetch workers
///
/// # Arguments
///
/// * `config` - Crawler configuration (per-request timeout)
/// * `user_agent` - User agent identification
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(config.timeout)
        .redirect(redirect_policy())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body
///
/// Only a `200 OK` response counts as success.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The full response body
/// * `Err(FetchError)` - Timeout, transport error, redirect policy violation
///   or unexpected status
pub async fn fetch_page(client: &Client, url: &Url) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| classify_error(url, e))?;

    Ok(body.to_vec())
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_redirect() {
        FetchError::RedirectPolicy {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}

/// One fetch worker
///
/// Workers share the dispatch receiver, the HTTP client and the throttle;
/// each pulls pages until the dispatch channel closes.
pub struct Fetcher {
    client: Client,
    throttle: Option<Arc<Throttle>>,
    inbox: Arc<Mutex<mpsc::Receiver<Page>>>,
    parse_tx: mpsc::Sender<Page>,
    error_tx: mpsc::Sender<Page>,
    span: Span,
}

impl Fetcher {
    /// Creates a worker that logs through `span`
    pub fn new(
        client: Client,
        throttle: Option<Arc<Throttle>>,
        inbox: Arc<Mutex<mpsc::Receiver<Page>>>,
        parse_tx: mpsc::Sender<Page>,
        error_tx: mpsc::Sender<Page>,
        span: Span,
    ) -> Self {
        Self {
            client,
            throttle,
            inbox,
            parse_tx,
            error_tx,
            span,
        }
    }

    /// Runs the worker until the dispatch channel closes or a downstream
    /// channel is dropped
    pub async fn run(self) {
        let span = self.span.clone();
        self.work().instrument(span).await
    }

    async fn work(self) {
        loop {
            // The lock only serializes receivers; it is released once a page arrives
            let next = self.inbox.lock().await.recv().await;
            let Some(mut page) = next else {
                break;
            };
            tracing::debug!(url = %page.url, "recv");

            if let Some(throttle) = &self.throttle {
                throttle.acquire().await;
            }

            let sent = match fetch_page(&self.client, &page.url).await {
                Ok(body) => {
                    tracing::debug!(url = %page.url, bytes = body.len(), "send");
                    page.body = Some(body);
                    self.parse_tx.send(page).await.is_ok()
                }
                Err(e) => {
                    tracing::warn!(url = %page.url, error = %e, "fetch failed");
                    self.error_tx.send(page).await.is_ok()
                }
            };

            if !sent {
                break;
            }
        }

        tracing::debug!("fetcher stopped");
    }
}
