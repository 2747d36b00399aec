// src/resolver/http.rs
// =============================================================================
// The network side of the resolver: the two HTTP requests we ever make.
//
// - embed probe: GET {embed endpoint}?url={normalized post URL}
// - direct fetch: GET {candidate URL}, following redirects
//
// Both sit behind the `Prober` trait. The classifier only talks to the
// trait, so tests can plug in a scripted prober instead of the network.
//
// Two long-lived reqwest clients are held for the whole run, one per
// request kind. They carry different User-Agent headers; apart from
// connection pooling (done internally by reqwest) they are never changed.
//
// Rust concepts:
// - async_trait: async methods in traits (stable Rust can't box them itself)
// - Send + Sync: the prober is shared across worker tasks
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::CheckerConfig;
use crate::error::Result;

/// Why a request produced no HTTP response at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The request took longer than the timeout
    #[error("request timed out")]
    Timeout,
    /// Redirect loop or too many hops
    #[error("too many redirects")]
    TooManyRedirects,
    /// DNS failure, refused connection, TLS handshake, ...
    #[error("connection failed: {0}")]
    Connect(String),
    /// Anything else reqwest can report
    #[error("{0}")]
    Other(String),
}

/// What the embed endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedResponse {
    pub status: u16,
    /// Raw response body; only meaningful when status is 200
    pub body: String,
}

/// The two requests the classifier needs.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Asks the embed-metadata endpoint about a normalized post URL.
    async fn embed(&self, post_url: &str, timeout: Duration) -> std::result::Result<EmbedResponse, ProbeError>;

    /// Fetches a candidate page and returns its final status code.
    async fn fetch(&self, url: &str, timeout: Duration) -> std::result::Result<u16, ProbeError>;
}

/// The real prober: two reqwest sessions.
pub struct HttpProber {
    embed_client: Client,
    fetch_client: Client,
    embed_endpoint: String,
}

impl HttpProber {
    /// Builds both sessions from the run configuration.
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        let embed_client = Client::builder()
            .user_agent(&config.embed_user_agent)
            .timeout(config.timeout)
            .build()?;

        let fetch_client = Client::builder()
            .user_agent(&config.fetch_user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            embed_client,
            fetch_client,
            embed_endpoint: config.embed_endpoint.clone(),
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn embed(&self, post_url: &str, timeout: Duration) -> std::result::Result<EmbedResponse, ProbeError> {
        debug!(url = post_url, "embed probe");

        let response = self
            .embed_client
            .get(&self.embed_endpoint)
            .query(&[("url", post_url)])
            .timeout(timeout)
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status().as_u16();
        // A body we can't read is treated like a body we can't parse:
        // the classifier only loses the canonical URL hint.
        let body = response.text().await.unwrap_or_default();

        Ok(EmbedResponse { status, body })
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> std::result::Result<u16, ProbeError> {
        debug!(url, "direct fetch");

        let response = self
            .fetch_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(categorize_error)?;

        Ok(response.status().as_u16())
    }
}

// Sorts reqwest errors into the few cases worth telling apart in a report.
fn categorize_error(error: reqwest::Error) -> ProbeError {
    if error.is_timeout() {
        ProbeError::Timeout
    } else if error.is_redirect() {
        ProbeError::TooManyRedirects
    } else if error.is_connect() {
        ProbeError::Connect(error.to_string())
    } else {
        ProbeError::Other(error.to_string())
    }
}
