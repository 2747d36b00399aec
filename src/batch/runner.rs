// src/batch/runner.rs
// =============================================================================
// The batch driver: one ResultRecord per input row.
//
// For each row:
//   raw URL -> post ID?  no  -> `invalid_url` record, no network
//                        yes -> cache hit?  yes -> reuse the stored outcome
//                                           no  -> pace, classify, store
//
// Rows are processed through an ordered, bounded stream:
// `concurrency` rows in flight at most, results in input order. With the
// default concurrency of 1 this is the plain sequential loop.
//
// Cancellation: once the watch flag flips to true, rows that haven't
// started produce no record, and rows waiting for the pacer give up.
// Requests already on the wire are left to finish or time out.
// =============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use super::cache::ResolutionCache;
use super::pacer::Pacer;
use crate::config::CheckerConfig;
use crate::resolver::{extract_identifier, AvailabilityCode, Classifier, ProbeOutcome};

/// One input row's post link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    pub raw_url: String,
}

impl PostReference {
    pub fn new(raw_url: impl Into<String>) -> Self {
        Self {
            raw_url: raw_url.into(),
        }
    }
}

/// What we report for one input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub identifier: Option<String>,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
    /// Same for every row of a batch
    pub checked_at: DateTime<Utc>,
}

/// Everything a batch run produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub checked_at: DateTime<Utc>,
    /// Index-aligned with the input rows; None = cancelled before resolving
    pub records: Vec<Option<ResultRecord>>,
}

impl BatchReport {
    /// Rows that got a record.
    pub fn completed(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    /// True if some rows were skipped because the batch was cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.completed() < self.records.len()
    }

    /// Number of recorded rows per availability code.
    pub fn summary(&self) -> BTreeMap<AvailabilityCode, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.iter().flatten() {
            *counts.entry(record.outcome.availability).or_insert(0) += 1;
        }
        counts
    }
}

// Marker for "gave up because the batch was cancelled"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cancelled;

/// Runs batches against one classifier with one pacing policy.
pub struct BatchRunner {
    classifier: Classifier,
    pacer: Pacer,
    timeout: Duration,
    concurrency: usize,
    progress_every: usize,
}

impl BatchRunner {
    pub fn new(classifier: Classifier, config: &CheckerConfig) -> Self {
        Self {
            classifier,
            pacer: Pacer::new(config.pause),
            timeout: config.timeout,
            concurrency: config.concurrency.max(1),
            progress_every: config.progress_every,
        }
    }

    /// Resolves every row. Never fails; cancelled rows come back as None.
    pub async fn run(&self, rows: &[PostReference], cancel: watch::Receiver<bool>) -> BatchReport {
        let checked_at = Utc::now();
        // One cache per run, dropped when the run ends
        let cache = ResolutionCache::new();
        let total = rows.len();

        info!(rows = total, concurrency = self.concurrency, "starting batch");

        let mut results = stream::iter(rows.iter())
            .map(|row| self.resolve_row(row, &cache, checked_at, cancel.clone()))
            .buffered(self.concurrency);

        let mut records = Vec::with_capacity(total);
        while let Some(record) = results.next().await {
            records.push(record);
            let done = records.len();
            if self.progress_every > 0 && done % self.progress_every == 0 {
                info!("checked {done}/{total} rows");
            }
        }

        let report = BatchReport { checked_at, records };
        info!(
            completed = report.completed(),
            distinct = cache.len(),
            cancelled = report.was_cancelled(),
            "batch finished"
        );
        report
    }

    async fn resolve_row(
        &self,
        row: &PostReference,
        cache: &ResolutionCache,
        checked_at: DateTime<Utc>,
        mut cancel: watch::Receiver<bool>,
    ) -> Option<ResultRecord> {
        if *cancel.borrow() {
            return None;
        }

        let Some(identifier) = extract_identifier(&row.raw_url) else {
            debug!(url = %row.raw_url, "no post ID in URL");
            return Some(ResultRecord {
                identifier: None,
                outcome: ProbeOutcome::missing_identifier(),
                checked_at,
            });
        };

        if let Some(outcome) = cache.get(&identifier) {
            debug!(identifier = %identifier, "cache hit");
            return Some(ResultRecord {
                identifier: Some(identifier),
                outcome,
                checked_at,
            });
        }

        let id = identifier.as_str();
        let cancel = &mut cancel;
        let outcome = cache
            .try_get_or_compute(id, || async move {
                // Held until classification ends, so the pause follows it
                let _pace = tokio::select! {
                    _ = wait_for_cancel(&mut *cancel) => return Err(Cancelled),
                    guard = self.pacer.wait() => guard,
                };
                if *cancel.borrow() {
                    return Err(Cancelled);
                }
                Ok(self.classifier.classify(id, &row.raw_url, self.timeout).await)
            })
            .await;

        match outcome {
            Ok(outcome) => Some(ResultRecord {
                identifier: Some(identifier),
                outcome,
                checked_at,
            }),
            Err(Cancelled) => {
                debug!(identifier = %identifier, "row skipped after cancellation");
                None
            }
        }
    }
}

// Resolves once the flag is true. If the sender is gone the batch can
// no longer be cancelled, so this never resolves.
async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
