// src/config.rs
// =============================================================================
// Run configuration: timeouts, pacing, client identities, endpoints.
//
// One CheckerConfig is built per run from the command-line flags and then
// handed (by reference) to the HTTP layer and the batch driver.
// =============================================================================

use std::time::Duration;

use crate::error::{AppError, Result};

/// Metadata endpoint that answers for public posts without authentication.
pub const DEFAULT_EMBED_ENDPOINT: &str = "https://publish.twitter.com/oembed";

/// Identity sent with direct page fetches, so the platform can apply its own
/// bot-access policy to us.
pub const DEFAULT_FETCH_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Twitterbot/1.0; +https://twitter.com/twitterbot)";

/// Upper bound for `timeout` and `pause`. One day is already far past useful.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Everything a batch run needs to know besides its input rows.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// URL of the embed-metadata endpoint
    pub embed_endpoint: String,
    /// User-Agent for the embed probe session
    pub embed_user_agent: String,
    /// User-Agent for the direct fetch session
    pub fetch_user_agent: String,
    /// Upper bound for every single HTTP request
    pub timeout: Duration,
    /// Pause between resolutions of distinct identifiers
    pub pause: Duration,
    /// How many rows may be resolved at once (1 = sequential)
    pub concurrency: usize,
    /// Log a progress line after this many rows (0 = never)
    pub progress_every: usize,
    /// Redirect hops followed by the direct fetch session
    pub max_redirects: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            embed_endpoint: DEFAULT_EMBED_ENDPOINT.to_string(),
            embed_user_agent: concat!("post-availability/", env!("CARGO_PKG_VERSION")).to_string(),
            fetch_user_agent: DEFAULT_FETCH_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            pause: Duration::from_millis(500),
            concurrency: 1,
            progress_every: 25,
            max_redirects: 10,
        }
    }
}

impl CheckerConfig {
    /// Converts a user-supplied number of seconds into a Duration.
    ///
    /// Rejects negative, NaN, infinite and out-of-range values.
    pub fn seconds(name: &str, value: f64) -> Result<Duration> {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::config(format!(
                "{name} must be a non-negative number of seconds, got {value}"
            )));
        }
        Duration::try_from_secs_f64(value)
            .map_err(|e| AppError::config(format!("{name} of {value} seconds is out of range: {e}")))
    }

    /// Checks the invariants the rest of the program relies on.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(AppError::config("concurrency must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(AppError::config("timeout must be greater than zero"));
        }
        if self.timeout > MAX_DURATION {
            return Err(AppError::config(format!(
                "timeout must be at most {} seconds",
                MAX_DURATION.as_secs()
            )));
        }
        if self.pause > MAX_DURATION {
            return Err(AppError::config(format!(
                "sleep must be at most {} seconds",
                MAX_DURATION.as_secs()
            )));
        }
        url::Url::parse(&self.embed_endpoint).map_err(|e| {
            AppError::config(format!("invalid embed endpoint '{}': {e}", self.embed_endpoint))
        })?;
        Ok(())
    }
}
