// src/resolver/classify.rs
// =============================================================================
// The availability classifier: turns HTTP answers into an AvailabilityCode.
//
// Two phases, neither retried:
//
// Phase 1 - embed probe
//   Ask the embed-metadata endpoint about the normalized URL.
//   200 means "go on to phase 2"; every other answer ends classification.
//
// Phase 2 - direct fetch
//   Walk the candidate URLs in order. 200/401/403/410/429/451 are
//   decisive and stop the walk. 404 and unexpected codes are remembered
//   and the walk continues. Network failures are remembered too.
//
// When the walk ends without a decisive answer, the LAST status we saw
// decides between not_found and unknown. Candidate order is therefore part
// of the observable behaviour.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use super::candidates::build_candidates;
use super::http::Prober;
use super::normalize::normalize;
use super::outcome::{AvailabilityCode, ProbeOutcome};

const RESTRICTED_DETAIL: &str = "post requires authentication or is protected";

/// What the embed probe status means for the rest of classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedDecision {
    /// 200: go on to the direct fetch phase
    Continue,
    /// Anything else: this is the final answer
    Stop(AvailabilityCode, String),
}

/// What a single direct fetch status means for the candidate walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// Stop walking, this is the answer
    Decisive(AvailabilityCode, Option<&'static str>),
    /// 404: maybe another candidate works
    NotFoundSoFar,
    /// Some other code: remember it and keep going
    UnexpectedSoFar,
}

/// Phase 1 decision table.
pub fn embed_decision(status: u16) -> EmbedDecision {
    match status {
        200 => EmbedDecision::Continue,
        401 | 403 => EmbedDecision::Stop(AvailabilityCode::Restricted, RESTRICTED_DETAIL.to_string()),
        404 => EmbedDecision::Stop(AvailabilityCode::NotFound, "post not found or removed".to_string()),
        429 => EmbedDecision::Stop(
            AvailabilityCode::RateLimited,
            "rate limited by embed endpoint".to_string(),
        ),
        other => EmbedDecision::Stop(
            AvailabilityCode::Unknown,
            format!("unexpected {other} response from embed endpoint"),
        ),
    }
}

/// Phase 2 decision table.
pub fn fetch_decision(status: u16) -> FetchDecision {
    match status {
        200 => FetchDecision::Decisive(AvailabilityCode::Public, None),
        401 | 403 => FetchDecision::Decisive(AvailabilityCode::Restricted, Some(RESTRICTED_DETAIL)),
        410 => FetchDecision::Decisive(AvailabilityCode::Gone, Some("post removed (410)")),
        429 => FetchDecision::Decisive(
            AvailabilityCode::RateLimited,
            Some("rate limited while fetching post"),
        ),
        451 => FetchDecision::Decisive(
            AvailabilityCode::UnavailableLegal,
            Some("post unavailable due to legal demand"),
        ),
        404 => FetchDecision::NotFoundSoFar,
        _ => FetchDecision::UnexpectedSoFar,
    }
}

// Only the canonical URL matters; the rest of the embed payload is ignored.
#[derive(Debug, Deserialize)]
struct EmbedPayload {
    url: Option<String>,
}

/// Runs the two-phase probe protocol against a `Prober`.
#[derive(Clone)]
pub struct Classifier {
    prober: Arc<dyn Prober>,
}

impl Classifier {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Classifies one post. Never fails: every problem becomes an outcome.
    pub async fn classify(&self, identifier: &str, original_url: &str, timeout: Duration) -> ProbeOutcome {
        let outcome = self.run_phases(identifier, original_url, timeout).await;
        info!(
            identifier,
            availability = %outcome.availability,
            status = ?outcome.http_status,
            embed_status = ?outcome.embed_status,
            "classified post"
        );
        outcome
    }

    async fn run_phases(&self, identifier: &str, original_url: &str, timeout: Duration) -> ProbeOutcome {
        let Some(normalized) = normalize(original_url) else {
            return ProbeOutcome::new(AvailabilityCode::InvalidUrl).with_detail("URL could not be normalized");
        };

        // --- Phase 1: embed probe ---
        let embed = match self.prober.embed(&normalized.to_string(), timeout).await {
            Ok(embed) => embed,
            Err(e) => {
                return ProbeOutcome::new(AvailabilityCode::Error)
                    .with_detail(format!("embed request failed: {e}"));
            }
        };
        let embed_status = embed.status;

        if let EmbedDecision::Stop(code, detail) = embed_decision(embed_status) {
            return ProbeOutcome::new(code)
                .with_status(embed_status)
                .with_embed_status(embed_status)
                .with_detail(detail);
        }

        let (canonical_url, parse_detail) = match serde_json::from_str::<EmbedPayload>(&embed.body) {
            Ok(payload) => (payload.url, None),
            Err(e) => (None, Some(format!("failed to parse embed payload: {e}"))),
        };
        debug!(identifier, canonical = ?canonical_url, "embed probe succeeded");

        // --- Phase 2: direct fetch over candidates ---
        let candidates = build_candidates(identifier, Some(&normalized), canonical_url.as_deref());
        let mut outcome = self.walk_candidates(&candidates, timeout).await.with_embed_status(embed_status);

        // The parse failure is only worth reporting if nothing else was said
        if outcome.detail.is_none() {
            outcome.detail = parse_detail;
        }
        outcome
    }

    async fn walk_candidates(&self, candidates: &[String], timeout: Duration) -> ProbeOutcome {
        let mut last_status: Option<u16> = None;
        let mut last_url: Option<&str> = None;
        let mut last_detail: Option<String> = None;
        let mut last_failure: Option<String> = None;

        for candidate in candidates {
            let status = match self.prober.fetch(candidate, timeout).await {
                Ok(status) => status,
                Err(e) => {
                    debug!(url = %candidate, error = %e, "candidate fetch failed");
                    last_failure = Some(e.to_string());
                    continue;
                }
            };
            debug!(url = %candidate, status, "candidate fetched");

            last_status = Some(status);
            last_url = Some(candidate.as_str());

            match fetch_decision(status) {
                FetchDecision::Decisive(code, detail) => {
                    let outcome = ProbeOutcome::new(code)
                        .with_status(status)
                        .with_resolved_url(candidate.as_str());
                    return match detail {
                        Some(detail) => outcome.with_detail(detail),
                        None => outcome,
                    };
                }
                FetchDecision::NotFoundSoFar => {
                    // Phase 2 only runs after an embed 200, so a 404 here
                    // always contradicts the embed probe.
                    last_detail = Some("post page returned 404 despite embed success".to_string());
                }
                FetchDecision::UnexpectedSoFar => {
                    last_detail = Some(format!("unexpected {status} response while fetching post"));
                }
            }
        }

        let Some(status) = last_status else {
            let detail = match last_failure {
                Some(reason) => format!("direct fetch failed: {reason}"),
                None => "direct fetch failed".to_string(),
            };
            return ProbeOutcome::new(AvailabilityCode::Error).with_detail(detail);
        };

        let code = if status == 404 {
            AvailabilityCode::NotFound
        } else {
            AvailabilityCode::Unknown
        };
        let mut outcome = ProbeOutcome::new(code).with_status(status);
        outcome.detail = last_detail;
        outcome.resolved_url = last_url.map(str::to_string);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::http::ProbeError;
    use crate::resolver::testing::ScriptedProber;

    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn classify_with(prober: ScriptedProber, id: &str, url: &str) -> (ProbeOutcome, Arc<ScriptedProber>) {
        let prober = Arc::new(prober);
        let classifier = Classifier::new(prober.clone());
        (classifier.classify(id, url, TIMEOUT).await, prober)
    }

    #[test]
    fn test_embed_table_is_total() {
        assert_eq!(embed_decision(200), EmbedDecision::Continue);
        for (status, code) in [
            (401, AvailabilityCode::Restricted),
            (403, AvailabilityCode::Restricted),
            (404, AvailabilityCode::NotFound),
            (429, AvailabilityCode::RateLimited),
            (500, AvailabilityCode::Unknown),
            (302, AvailabilityCode::Unknown),
            (410, AvailabilityCode::Unknown),
        ] {
            assert!(matches!(embed_decision(status), EmbedDecision::Stop(c, _) if c == code), "{status}");
        }
    }

    #[test]
    fn test_fetch_table_is_total() {
        for (status, code) in [
            (200, AvailabilityCode::Public),
            (401, AvailabilityCode::Restricted),
            (403, AvailabilityCode::Restricted),
            (410, AvailabilityCode::Gone),
            (429, AvailabilityCode::RateLimited),
            (451, AvailabilityCode::UnavailableLegal),
        ] {
            assert!(matches!(fetch_decision(status), FetchDecision::Decisive(c, _) if c == code), "{status}");
        }
        assert_eq!(fetch_decision(404), FetchDecision::NotFoundSoFar);
        assert_eq!(fetch_decision(500), FetchDecision::UnexpectedSoFar);
        assert_eq!(fetch_decision(301), FetchDecision::UnexpectedSoFar);
    }

    #[tokio::test]
    async fn test_public_via_canonical_url() {
        let prober = ScriptedProber::new()
            .embed(
                "https://twitter.com/acct/status/123",
                200,
                r#"{"url": "https://x.com/acct/status/123"}"#,
            )
            .fetch("https://x.com/acct/status/123", 200);

        let (outcome, prober) = classify_with(prober, "123", "https://twitter.com/acct/status/123").await;

        assert_eq!(outcome.availability, AvailabilityCode::Public);
        assert_eq!(outcome.http_status, Some(200));
        assert_eq!(outcome.embed_status, Some(200));
        assert_eq!(outcome.resolved_url.as_deref(), Some("https://x.com/acct/status/123"));
        assert_eq!(outcome.detail, None);
        assert_eq!(prober.fetched(), vec!["https://x.com/acct/status/123"]);
    }

    #[tokio::test]
    async fn test_embed_404_is_not_found_without_fetching() {
        let prober = ScriptedProber::new().embed("https://x.com/acct/status/456", 404, "");

        let (outcome, prober) = classify_with(prober, "456", "https://x.com/acct/status/456").await;

        assert_eq!(outcome.availability, AvailabilityCode::NotFound);
        assert_eq!(outcome.http_status, Some(404));
        assert_eq!(outcome.embed_status, Some(404));
        assert_eq!(outcome.resolved_url, None);
        assert!(prober.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_embed_stop_codes() {
        for (status, code) in [
            (401, AvailabilityCode::Restricted),
            (403, AvailabilityCode::Restricted),
            (429, AvailabilityCode::RateLimited),
            (503, AvailabilityCode::Unknown),
        ] {
            let prober = ScriptedProber::new().embed("https://x.com/a/status/1", status, "");
            let (outcome, _) = classify_with(prober, "1", "https://x.com/a/status/1").await;
            assert_eq!(outcome.availability, code, "{status}");
            assert_eq!(outcome.http_status, Some(status));
        }
    }

    #[tokio::test]
    async fn test_embed_network_failure_is_error() {
        let prober = ScriptedProber::new().embed_error("https://x.com/a/status/1", ProbeError::Timeout);

        let (outcome, _) = classify_with(prober, "1", "https://x.com/a/status/1").await;

        assert_eq!(outcome.availability, AvailabilityCode::Error);
        assert_eq!(outcome.http_status, None);
        assert_eq!(outcome.embed_status, None);
        assert_eq!(outcome.detail.as_deref(), Some("embed request failed: request timed out"));
    }

    #[tokio::test]
    async fn test_unknown_host_is_invalid_without_network() {
        let (outcome, prober) =
            classify_with(ScriptedProber::new(), "1", "https://example.com/a/status/1").await;

        assert_eq!(outcome.availability, AvailabilityCode::InvalidUrl);
        assert_eq!(prober.embed_calls(), 0);
    }

    #[tokio::test]
    async fn test_all_candidates_404_flags_discrepancy() {
        // Unscripted fetches answer 404
        let prober = ScriptedProber::new().embed(
            "https://x.com/acct/status/9",
            200,
            r#"{"url": "https://twitter.com/acct/status/9"}"#,
        );

        let (outcome, prober) = classify_with(prober, "9", "https://x.com/acct/status/9").await;

        assert_eq!(outcome.availability, AvailabilityCode::NotFound);
        assert_eq!(outcome.http_status, Some(404));
        assert_eq!(outcome.embed_status, Some(200));
        assert!(outcome.detail.as_deref().unwrap().contains("despite embed success"));
        assert_eq!(prober.fetched().len(), 3);
        assert_eq!(outcome.resolved_url.as_deref(), Some("https://x.com/i/status/9"));
    }

    #[tokio::test]
    async fn test_connection_error_moves_to_next_candidate() {
        let prober = ScriptedProber::new()
            .embed("https://x.com/acct/status/5", 200, r#"{"url": "https://x.com/acct/status/5"}"#)
            .fetch_error(
                "https://x.com/acct/status/5",
                ProbeError::Connect("connection refused".to_string()),
            )
            .fetch("https://x.com/i/web/status/5", 200);

        let (outcome, _) = classify_with(prober, "5", "https://x.com/acct/status/5").await;

        assert_eq!(outcome.availability, AvailabilityCode::Public);
        assert_eq!(outcome.resolved_url.as_deref(), Some("https://x.com/i/web/status/5"));
    }

    #[tokio::test]
    async fn test_all_fetches_fail_is_error_with_last_reason() {
        let url = "https://x.com/acct/status/7";
        let prober = ScriptedProber::new()
            .embed(url, 200, r#"{"url": "https://x.com/acct/status/7"}"#)
            .fetch_error(url, ProbeError::Timeout)
            .fetch_error("https://x.com/i/web/status/7", ProbeError::Timeout)
            .fetch_error("https://x.com/i/status/7", ProbeError::TooManyRedirects);

        let (outcome, _) = classify_with(prober, "7", url).await;

        assert_eq!(outcome.availability, AvailabilityCode::Error);
        assert_eq!(outcome.http_status, None);
        assert_eq!(outcome.embed_status, Some(200));
        assert_eq!(outcome.detail.as_deref(), Some("direct fetch failed: too many redirects"));
    }

    #[tokio::test]
    async fn test_last_status_breaks_the_tie() {
        let url = "https://x.com/acct/status/3";
        let prober = ScriptedProber::new()
            .embed(url, 200, "{}")
            .fetch(url, 404)
            .fetch("https://x.com/i/web/status/3", 404)
            .fetch("https://x.com/i/status/3", 500);

        let (outcome, _) = classify_with(prober, "3", url).await;

        assert_eq!(outcome.availability, AvailabilityCode::Unknown);
        assert_eq!(outcome.http_status, Some(500));
        assert_eq!(outcome.resolved_url.as_deref(), Some("https://x.com/i/status/3"));
    }

    #[tokio::test]
    async fn test_decisive_codes_stop_the_walk() {
        for (status, code) in [
            (403, AvailabilityCode::Restricted),
            (410, AvailabilityCode::Gone),
            (429, AvailabilityCode::RateLimited),
            (451, AvailabilityCode::UnavailableLegal),
        ] {
            let url = "https://x.com/acct/status/4";
            let prober = ScriptedProber::new().embed(url, 200, "{}").fetch(url, status);
            let (outcome, prober) = classify_with(prober, "4", url).await;
            assert_eq!(outcome.availability, code, "{status}");
            assert_eq!(prober.fetched().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_bad_embed_body_still_checks_candidates() {
        let url = "https://x.com/acct/status/2";
        let prober = ScriptedProber::new()
            .embed(url, 200, "<html>not json</html>")
            .fetch(url, 200);

        let (outcome, _) = classify_with(prober, "2", url).await;

        assert_eq!(outcome.availability, AvailabilityCode::Public);
        assert!(outcome.detail.as_deref().unwrap().starts_with("failed to parse embed payload"));
    }
}
