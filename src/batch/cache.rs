// src/batch/cache.rs
// =============================================================================
// Per-run memo of classification results, keyed by post identifier.
//
// Guarantee: within one run, each identifier is classified AT MOST ONCE,
// even when several workers ask for it at the same moment. The first
// caller runs the computation; everyone else waits for that result.
//
// How: the map holds one `OnceCell` per identifier. The map lock is only
// held long enough to find or insert the cell, never across a network
// call, so different identifiers resolve in parallel.
//
// The cache is owned by one batch run and dropped with it. Nothing is
// persisted between runs.
// =============================================================================

use std::collections::HashMap;
#[cfg(test)]
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::resolver::ProbeOutcome;

type Slot = Arc<OnceCell<ProbeOutcome>>;

#[derive(Default)]
pub struct ResolutionCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored outcome for `identifier`, running `compute` only
    /// if no outcome exists yet.
    ///
    /// If the computing future is dropped before it finishes (cancellation),
    /// nothing is stored and the next caller computes again. The batch
    /// driver needs to give up while pacing, so it uses `try_get_or_compute`.
    #[cfg(test)]
    pub async fn get_or_compute<F, Fut>(&self, identifier: &str, compute: F) -> ProbeOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProbeOutcome>,
    {
        let computed = self
            .try_get_or_compute(identifier, || async move { Ok::<_, Infallible>(compute().await) })
            .await;
        match computed {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Like `get_or_compute`, but the computation may give up. An `Err` is
    /// handed back to this caller and nothing is stored.
    pub async fn try_get_or_compute<F, Fut, E>(&self, identifier: &str, compute: F) -> Result<ProbeOutcome, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ProbeOutcome, E>>,
    {
        let slot = self.slot(identifier);
        let outcome = slot.get_or_try_init(compute).await?.clone();
        Ok(outcome)
    }

    /// The stored outcome, if this identifier has already been resolved.
    pub fn get(&self, identifier: &str) -> Option<ProbeOutcome> {
        let slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(identifier).and_then(|slot| slot.get().cloned())
    }

    /// Number of identifiers with a stored outcome.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.values().filter(|slot| slot.initialized()).count()
    }

    fn slot(&self, identifier: &str) -> Slot {
        // The guard is dropped at the end of this function, before any await
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}
