//! Result reconciliation
//!
//! Drains a pass's result stream as results arrive, persists successes and
//! keeps the batch counters. Outcome classes:
//!
//! - saved: extraction succeeded and the listing update hit a row;
//! - save failure: extraction succeeded but the update failed or found no
//!   row; counted as an error, never retried;
//! - navigation failure: the page did not load; on the primary pass the URL
//!   is queued for retry, on the retry pass it is final.
//!
//! A retry success moves one URL from errors to saved.

use futures::{Stream, StreamExt};
use log::{error, info, warn};
use std::sync::Arc;

use crate::batch::ExtractionResult;
use crate::store::{ListingStore, ListingUpdate};

/// Which pass a result stream belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Primary,
    Retry,
}

/// Classification of one result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Saved,
    SaveFailed,
    NavigationFailed,
}

/// Per-pass tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub received: usize,
    pub saved: usize,
    pub save_failed: usize,
    pub navigation_failed: usize,
}

/// Running counters for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRun {
    pub total: usize,
    /// Primary-pass results received
    pub processed: usize,
    /// Retry-pass results received
    pub retried: usize,
    pub saved: usize,
    pub errors: usize,
    /// Primary navigation failures awaiting the retry pass
    pub navigation_failed: Vec<String>,
    /// Save failures from both passes
    pub save_failed: Vec<String>,
    /// URLs whose retry also failed to load
    pub retry_failed: Vec<String>,
}

impl BatchRun {
    /// URLs to record at the end of the batch: save failures, then retry failures
    pub fn final_failures(&self) -> Vec<String> {
        self.save_failed
            .iter()
            .chain(&self.retry_failed)
            .cloned()
            .collect()
    }

    /// Tasks neither saved nor counted as errors
    ///
    /// Zero once both passes have been reconciled.
    pub fn unaccounted(&self) -> usize {
        self.total.saturating_sub(self.saved + self.errors)
    }
}

pub struct ResultReconciler {
    store: Arc<dyn ListingStore>,
    label: String,
    run: BatchRun,
}

impl ResultReconciler {
    pub fn new(store: Arc<dyn ListingStore>, label: impl Into<String>, total: usize) -> Self {
        Self {
            store,
            label: label.into(),
            run: BatchRun {
                total,
                ..BatchRun::default()
            },
        }
    }

    pub fn run(&self) -> &BatchRun {
        &self.run
    }

    pub fn into_run(self) -> BatchRun {
        self.run
    }

    /// Consume `results` to exhaustion, folding each into the counters
    pub async fn reconcile<S>(&mut self, pass: Pass, mut results: S) -> PassOutcome
    where
        S: Stream<Item = ExtractionResult> + Unpin,
    {
        let mut outcome = PassOutcome::default();
        while let Some(result) = results.next().await {
            outcome.received += 1;
            match self.classify(pass, result).await {
                Outcome::Saved => outcome.saved += 1,
                Outcome::SaveFailed => outcome.save_failed += 1,
                Outcome::NavigationFailed => outcome.navigation_failed += 1,
            }
        }

        info!(
            "{}: {:?} pass reconciled {} results (saved {}, save failures {}, navigation failures {})",
            self.label,
            pass,
            outcome.received,
            outcome.saved,
            outcome.save_failed,
            outcome.navigation_failed
        );
        outcome
    }

    async fn classify(&mut self, pass: Pass, result: ExtractionResult) -> Outcome {
        match pass {
            Pass::Primary => self.run.processed += 1,
            Pass::Retry => self.run.retried += 1,
        }

        if let Some(reason) = &result.error {
            match pass {
                Pass::Primary => {
                    warn!("{}: navigation failed for {}: {}", self.label, result.url, reason);
                    self.run.errors += 1;
                    self.run.navigation_failed.push(result.url);
                }
                Pass::Retry => {
                    warn!("{}: retry failed for {}: {}", self.label, result.url, reason);
                    self.run.retry_failed.push(result.url);
                }
            }
            return Outcome::NavigationFailed;
        }

        let update = ListingUpdate {
            content: result.content,
            photos: result.photos,
        };
        match self.store.update_listing(&result.reference, &update).await {
            Ok(()) => {
                self.run.saved += 1;
                if pass == Pass::Retry {
                    // Provisionally counted as an error after the primary pass
                    self.run.errors = self.run.errors.saturating_sub(1);
                    info!("{}: retry succeeded for {}", self.label, result.url);
                }
                Outcome::Saved
            }
            Err(e) => {
                warn!(
                    "{}: failed to save {} (ref '{}'): {}",
                    self.label, result.url, result.reference, e
                );
                if pass == Pass::Primary {
                    self.run.errors += 1;
                }
                self.run.save_failed.push(result.url);
                Outcome::SaveFailed
            }
        }
    }

    /// Hand the primary navigation failures to the retry pass
    pub fn take_navigation_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.run.navigation_failed)
    }

    /// Record the final failure list, if any
    ///
    /// Advisory: a store error is logged and otherwise ignored. Returns
    /// whether the store was called.
    pub async fn record_final_failures(&self) -> bool {
        let failures = self.run.final_failures();
        if failures.is_empty() {
            return false;
        }
        if let Err(e) = self.store.record_failed_links(&failures).await {
            error!(
                "{}: failed to record {} failed links: {}",
                self.label,
                failures.len(),
                e
            );
        }
        true
    }
}
