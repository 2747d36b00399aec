// src/batch/mod.rs
// =============================================================================
// Runs the resolver over a whole batch of input rows.
//
// Submodules:
// - cache: per-run, single-flight memo of outcomes by post ID
// - pacer: shared pause between distinct-identifier resolutions
// - runner: the row loop, bounded concurrency and cancellation
// =============================================================================

mod cache;
mod pacer;
mod runner;

pub use runner::{BatchReport, BatchRunner, PostReference, ResultRecord};

use tokio::sync::watch;
use tracing::warn;

/// Returns a cancellation flag that flips to true on the first Ctrl-C.
///
/// The batch stops starting new rows; requests already in flight finish.
pub fn cancel_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight requests");
            let _ = tx.send(true);
            // Keep the sender alive so receivers don't see a closed channel
            std::future::pending::<()>().await;
        }
    });
    rx
}
