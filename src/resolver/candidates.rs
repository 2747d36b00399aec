// src/resolver/candidates.rs
// =============================================================================
// Builds the ordered list of URLs to try when fetching a post directly.
//
// The same post is reachable through several aliases (twitter.com, x.com,
// mobile.*, /i/web/status/ID, ...). We collapse them all onto ONE host so
// we don't fetch the same page twice, and try them in priority order:
//
//   1. the canonical URL the embed probe reported
//   2. the caller's own (normalized) URL
//   3. generic "view post by ID" templates on both domains
//
// A seed that carries a query string is tried twice: once without the
// query, and later once with it. Some posts only render with a specific
// query parameter, so the exact original link is worth an attempt.
//
// The list is never empty: the templates always normalize.
// =============================================================================

use url::Url;

use super::normalize::{normalize_parsed, with_scheme, NormalizedUrl};

/// Every candidate is rewritten onto this host.
pub const CANONICAL_HOST: &str = "x.com";

/// The generic "view post by ID" URLs, in the order they are tried.
pub fn template_urls(identifier: &str) -> [String; 4] {
    [
        format!("https://x.com/i/web/status/{identifier}"),
        format!("https://twitter.com/i/web/status/{identifier}"),
        format!("https://x.com/i/status/{identifier}"),
        format!("https://twitter.com/i/status/{identifier}"),
    ]
}

/// Returns de-duplicated candidate URLs in the order they should be fetched.
pub fn build_candidates(
    identifier: &str,
    normalized_input: Option<&NormalizedUrl>,
    canonical_url: Option<&str>,
) -> Vec<String> {
    let mut seeds: Vec<String> = Vec::with_capacity(6);
    if let Some(canonical) = canonical_url {
        seeds.push(canonical.to_string());
    }
    if let Some(input) = normalized_input {
        seeds.push(input.to_string());
    }
    seeds.extend(template_urls(identifier));

    let mut candidates: Vec<String> = Vec::new();
    for seed in seeds.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let Ok(parsed) = Url::parse(&seed_with_scheme(seed)) else {
            continue;
        };
        // Seeds on unknown hosts are dropped entirely
        let Some(normalized) = normalize_parsed(&parsed) else {
            continue;
        };

        let canonical = normalized.with_host(CANONICAL_HOST);
        push_unique(&mut candidates, canonical.to_string());

        if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
            push_unique(&mut candidates, format!("{canonical}?{query}"));
        }
    }

    candidates
}

// Seeds are more forgiving than user input: stray leading slashes go
fn seed_with_scheme(seed: &str) -> String {
    if seed.starts_with("//") {
        with_scheme(seed)
    } else {
        with_scheme(seed.trim_start_matches('/'))
    }
}

// Exact-string dedup, first occurrence wins
fn push_unique(candidates: &mut Vec<String>, url: String) {
    if !candidates.contains(&url) {
        candidates.push(url);
    }
}
