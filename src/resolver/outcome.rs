// src/resolver/outcome.rs
// =============================================================================
// The availability taxonomy: what we concluded about a post, and why.
//
// AvailabilityCode is a closed set. Every row of every batch ends up with
// exactly one of these, including rows whose URL was garbage or whose
// requests all failed. There is no separate "this row crashed" channel.
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a post is (or isn't) publicly reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityCode {
    /// No post ID in the URL, or the URL is not on a known host
    InvalidUrl,
    /// The post page loaded
    Public,
    /// Protected account or login wall (401/403)
    Restricted,
    /// 404 from the embed probe, or from every direct fetch
    NotFound,
    /// The platform told us to slow down (429)
    RateLimited,
    /// Withheld for legal reasons (451)
    UnavailableLegal,
    /// Explicitly removed (410)
    Gone,
    /// Got answers, but none we know how to interpret
    Unknown,
    /// Never got an HTTP answer at all
    Error,
}

impl AvailabilityCode {
    /// Every code, in declaration order. Handy for summaries.
    pub const ALL: [AvailabilityCode; 9] = [
        AvailabilityCode::InvalidUrl,
        AvailabilityCode::Public,
        AvailabilityCode::Restricted,
        AvailabilityCode::NotFound,
        AvailabilityCode::RateLimited,
        AvailabilityCode::UnavailableLegal,
        AvailabilityCode::Gone,
        AvailabilityCode::Unknown,
        AvailabilityCode::Error,
    ];

    /// The snake_case name used in output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityCode::InvalidUrl => "invalid_url",
            AvailabilityCode::Public => "public",
            AvailabilityCode::Restricted => "restricted",
            AvailabilityCode::NotFound => "not_found",
            AvailabilityCode::RateLimited => "rate_limited",
            AvailabilityCode::UnavailableLegal => "unavailable_legal",
            AvailabilityCode::Gone => "gone",
            AvailabilityCode::Unknown => "unknown",
            AvailabilityCode::Error => "error",
        }
    }
}

impl fmt::Display for AvailabilityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width specifiers like {:<18} work in tables
        f.pad(self.as_str())
    }
}

/// The result of classifying one post identifier.
///
/// Built once per identifier per batch and never modified afterwards;
/// rows that share the identifier all get a clone of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub availability: AvailabilityCode,
    /// Status code behind the decision (embed or direct fetch)
    pub http_status: Option<u16>,
    /// Human-readable explanation
    pub detail: Option<String>,
    /// Status of the embed probe, kept for diagnostics
    pub embed_status: Option<u16>,
    /// The candidate URL that produced the decision
    pub resolved_url: Option<String>,
}

impl ProbeOutcome {
    /// An outcome with only a code set; fill the rest in with the builders.
    pub fn new(availability: AvailabilityCode) -> Self {
        Self {
            availability,
            http_status: None,
            detail: None,
            embed_status: None,
            resolved_url: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_embed_status(mut self, status: u16) -> Self {
        self.embed_status = Some(status);
        self
    }

    pub fn with_resolved_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_url = Some(url.into());
        self
    }

    /// Outcome for a row whose URL carries no post ID.
    pub fn missing_identifier() -> Self {
        Self::new(AvailabilityCode::InvalidUrl).with_detail("post ID not found in URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_as_snake_case() {
        for code in AvailabilityCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_builder_fills_fields() {
        let outcome = ProbeOutcome::new(AvailabilityCode::Public)
            .with_status(200)
            .with_embed_status(200)
            .with_resolved_url("https://x.com/a/status/1");
        assert_eq!(outcome.availability, AvailabilityCode::Public);
        assert_eq!(outcome.http_status, Some(200));
        assert_eq!(outcome.embed_status, Some(200));
        assert_eq!(outcome.detail, None);
    }

    #[test]
    fn test_display_honours_width() {
        assert_eq!(format!("{:<8}|", AvailabilityCode::Gone), "gone    |");
    }

    #[test]
    fn test_missing_identifier_has_no_statuses() {
        let outcome = ProbeOutcome::missing_identifier();
        assert_eq!(outcome.availability, AvailabilityCode::InvalidUrl);
        assert_eq!(outcome.http_status, None);
        assert_eq!(outcome.embed_status, None);
        assert_eq!(outcome.resolved_url, None);
    }
}
