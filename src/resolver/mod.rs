// src/resolver/mod.rs
// =============================================================================
// The availability resolution engine.
//
// Submodules, leaf-first:
// - identifier: pulls the numeric post ID out of a raw URL
// - normalize: validates/canonicalizes a URL onto a known host
// - candidates: builds the ordered list of fallback URLs to fetch
// - outcome: the AvailabilityCode taxonomy and the ProbeOutcome value
// - http: the Prober trait and its reqwest implementation
// - classify: the two-phase probe protocol
//
// This file re-exports the pieces the rest of the program uses, so callers
// write `resolver::Classifier` instead of `resolver::classify::Classifier`.
// =============================================================================

mod candidates;
mod classify;
mod http;
mod identifier;
mod normalize;
mod outcome;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::Classifier;
pub use http::HttpProber;
pub use identifier::extract_identifier;
pub use outcome::{AvailabilityCode, ProbeOutcome};
