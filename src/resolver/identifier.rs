// src/resolver/identifier.rs
// =============================================================================
// Pulls the numeric post ID out of a raw URL string.
//
// The ID is what makes two different-looking links "the same post":
//   https://twitter.com/acct/status/123
//   https://www.x.com/acct/status/123?s=20
//   mobile.twitter.com/acct/statuses/123
// all name post 123.
//
// This is a pure function: no network, same input = same output.
// A string that doesn't look like a post URL simply has no ID; that is
// not an error, the batch driver turns it into an `invalid_url` row.
// =============================================================================

use std::sync::OnceLock;

use regex::Regex;

// Compiled once, shared by every call
static POST_URL: OnceLock<Regex> = OnceLock::new();

fn post_url_pattern() -> &'static Regex {
    POST_URL.get_or_init(|| {
        // Either domain family, any account segment, then /status/ or
        // /statuses/ followed by the digits we want.
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?(?:twitter|x)\.com/.+?/status(?:es)?/(\d+)")
            .expect("post URL pattern is valid")
    })
}

/// Returns the post ID embedded in the URL, or None when there isn't one.
pub fn extract_identifier(raw_url: &str) -> Option<String> {
    post_url_pattern()
        .captures(raw_url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}
