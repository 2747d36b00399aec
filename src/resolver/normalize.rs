// src/resolver/normalize.rs
// =============================================================================
// Turns a raw, user-typed post URL into one canonical shape:
//
//     https://{known host}{path}
//
// Steps (order matters):
// 1. Trim whitespace, reject empty strings
// 2. "//host/..." gets "https:" in front
// 3. Anything without http:// or https:// gets "https://" in front
// 4. Reject an empty authority ("/x.com/..." becomes "https:///x.com/...")
// 5. Parse, lower-case the host, strip a leading "www."
// 6. Reject hosts that aren't one of the known platform domains
// 7. Drop the query string and fragment
//
// A rejected URL is not an error. It means "this is not a post URL we
// know how to check", and callers use that as a signal.
// =============================================================================

use std::fmt;

use url::Url;

/// Host variants that belong to the platform.
/// Anything else is rejected by `normalize`.
pub const KNOWN_HOSTS: [&str; 5] = [
    "twitter.com",
    "mobile.twitter.com",
    "m.twitter.com",
    "x.com",
    "mobile.x.com",
];

/// A validated post URL: always https, always a known host, never a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl {
    host: String,
    path: String,
}

impl NormalizedUrl {
    /// Same path on a different host.
    pub fn with_host(&self, host: &str) -> NormalizedUrl {
        NormalizedUrl {
            host: host.to_string(),
            path: self.path.clone(),
        }
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "https://{}{}", self.host, self.path)
    }
}

/// Adds a scheme to scheme-less input so the URL parser accepts it.
///
/// "//x.com/a" becomes "https://x.com/a", "x.com/a" becomes "https://x.com/a".
pub fn with_scheme(raw: &str) -> String {
    if raw.starts_with("//") {
        return format!("https:{raw}");
    }
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

// True when nothing sits between "://" and the path. The URL parser would
// quietly skip the extra slashes, so this is checked on the text.
fn has_empty_authority(url: &str) -> bool {
    match url.split_once("://") {
        Some((_, rest)) => rest.is_empty() || rest.starts_with('/'),
        None => true,
    }
}

/// Validates and canonicalizes a post URL. None means "not a known post URL".
pub fn normalize(raw_url: &str) -> Option<NormalizedUrl> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let prefixed = with_scheme(trimmed);
    if has_empty_authority(&prefixed) {
        return None;
    }
    let parsed = Url::parse(&prefixed).ok()?;
    normalize_parsed(&parsed)
}

/// The host check and reassembly part of `normalize`, for callers that
/// already hold a parsed URL.
pub fn normalize_parsed(parsed: &Url) -> Option<NormalizedUrl> {
    // Credentials or an explicit non-default port mean the authority is not
    // a bare known host.
    if !parsed.username().is_empty() || parsed.password().is_some() || parsed.port().is_some() {
        return None;
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if !KNOWN_HOSTS.contains(&host) {
        return None;
    }

    Some(NormalizedUrl {
        host: host.to_string(),
        path: parsed.path().to_string(),
    })
}
