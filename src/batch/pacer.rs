// src/batch/pacer.rs
// =============================================================================
// Global request pacing.
//
// The platform has informal rate limits, so we leave a gap between the
// resolution of one identifier and the next. The gap is counted from the
// END of a resolution, so a slow request still gets a full pause after it.
//
// With several workers the pacer is shared: a worker waits for the next
// free slot, and when its resolution finishes it pushes that slot out to
// `now + interval`. The whole batch (not each worker) stays under the pace.
//
// Pacing is not correctness. The classifier knows nothing about it; the
// batch driver takes a `PaceGuard` before each cache miss and holds it
// until the classification is done.
// =============================================================================

use std::sync::Mutex as SyncMutex;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

pub struct Pacer {
    interval: Duration,
    // Queues waiting workers in arrival order
    turn: Mutex<()>,
    // When the next resolution may start; None before the first one
    next_slot: SyncMutex<Option<Instant>>,
}

/// Held while one resolution runs. Dropping it (finished or abandoned)
/// books the pause that follows.
pub struct PaceGuard<'a> {
    pacer: &'a Pacer,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            turn: Mutex::new(()),
            next_slot: SyncMutex::new(None),
        }
    }

    /// Waits until this caller's turn. The first call returns immediately.
    pub async fn wait(&self) -> PaceGuard<'_> {
        if self.interval.is_zero() {
            return PaceGuard { pacer: self };
        }

        let _turn = self.turn.lock().await;
        // A finishing resolution may push the slot out while we sleep
        while let Some(slot) = self.slot() {
            if slot <= Instant::now() {
                break;
            }
            sleep_until(slot).await;
        }

        // Starts stay spaced too, for workers running side by side
        self.push_slot(Instant::now());
        PaceGuard { pacer: self }
    }

    fn slot(&self) -> Option<Instant> {
        *self.next_slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Moves the next slot to `from + interval`, never earlier than it is
    fn push_slot(&self, from: Instant) {
        let Some(candidate) = from.checked_add(self.interval) else {
            return;
        };
        let mut slot = self.next_slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(match *slot {
            Some(existing) if existing > candidate => existing,
            _ => candidate,
        });
    }
}

impl Drop for PaceGuard<'_> {
    fn drop(&mut self) {
        if !self.pacer.interval.is_zero() {
            self.pacer.push_slot(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let pacer = Pacer::new(Duration::from_secs(60));
        let started = std::time::Instant::now();
        let _guard = pacer.wait().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_waits_are_spaced_by_interval() {
        let pacer = Pacer::new(Duration::from_millis(30));
        let started = std::time::Instant::now();
        for _ in 0..3 {
            pacer.wait().await;
        }
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_pause_counts_from_end_of_slow_resolution() {
        let pacer = Pacer::new(Duration::from_millis(40));

        let guard = pacer.wait().await;
        // Resolution takes longer than the pause
        tokio::time::sleep(Duration::from_millis(80)).await;
        drop(guard);
        let finished = std::time::Instant::now();

        let _next = pacer.wait().await;
        assert!(finished.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_held_guards_keep_concurrent_starts_spaced() {
        let pacer = Pacer::new(Duration::from_millis(30));
        let started = std::time::Instant::now();
        let _first = pacer.wait().await;
        let _second = pacer.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_zero_interval_never_sleeps() {
        let pacer = Pacer::new(Duration::ZERO);
        let started = std::time::Instant::now();
        for _ in 0..100 {
            pacer.wait().await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
