// src/resolver/testing.rs
// Scripted in-memory prober for unit tests. Compiled only under cfg(test).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::http::{EmbedResponse, ProbeError, Prober};

/// Answers requests from fixed tables and remembers what was asked.
#[derive(Default)]
pub struct ScriptedProber {
    /// Keyed by the normalized post URL passed to `embed`
    embeds: HashMap<String, Result<EmbedResponse, ProbeError>>,
    /// Keyed by candidate URL; unknown URLs answer 404
    fetches: HashMap<String, Result<u16, ProbeError>>,
    /// How long every embed call takes
    embed_delay: Duration,
    embed_calls: AtomicUsize,
    fetch_log: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embed(mut self, post_url: &str, status: u16, body: &str) -> Self {
        self.embeds.insert(
            post_url.to_string(),
            Ok(EmbedResponse {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn embed_delay(mut self, delay: Duration) -> Self {
        self.embed_delay = delay;
        self
    }

    pub fn embed_error(mut self, post_url: &str, error: ProbeError) -> Self {
        self.embeds.insert(post_url.to_string(), Err(error));
        self
    }

    pub fn fetch(mut self, url: &str, status: u16) -> Self {
        self.fetches.insert(url.to_string(), Ok(status));
        self
    }

    pub fn fetch_error(mut self, url: &str, error: ProbeError) -> Self {
        self.fetches.insert(url.to_string(), Err(error));
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetch_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn embed(&self, post_url: &str, _timeout: Duration) -> Result<EmbedResponse, ProbeError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.embed_delay.is_zero() {
            // Yield so concurrent callers actually interleave
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.embed_delay).await;
        }
        self.embeds
            .get(post_url)
            .cloned()
            .unwrap_or(Err(ProbeError::Other(format!("unscripted embed for {post_url}"))))
    }

    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<u16, ProbeError> {
        self.fetch_log.lock().unwrap().push(url.to_string());
        self.fetches.get(url).cloned().unwrap_or(Ok(404))
    }
}
