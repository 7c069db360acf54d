//! Batch orchestration
//!
//! `ScrapeService::submit` validates and admits a batch, then runs it on a
//! background task: primary pool, reconciliation, retry pool over navigation
//! failures, reconciliation again, final failure recording. The admission
//! gate is held for the whole run and released last.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use super::types::{BatchContext, BatchSummary, ScrapeRequest, SubmitError};
use crate::admission::{JobAdmissionGate, RunGuard};
use crate::config::ScraperConfig;
use crate::extraction::ExtractionSettings;
use crate::page_driver::PageDriver;
use crate::reconciler::{Pass, ResultReconciler};
use crate::retry::RetryCoordinator;
use crate::store::ListingStore;
use crate::worker_pool::{PoolSettings, WorkerPool};

/// Handle to an accepted batch running in the background
pub struct BatchHandle {
    batch_id: Uuid,
    task: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Wait for the batch to finish
    pub async fn wait(self) -> Option<BatchSummary> {
        match self.task.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!("Batch {} task failed: {}", self.batch_id, e);
                None
            }
        }
    }
}

pub struct ScrapeService {
    driver: Arc<dyn PageDriver>,
    store: Arc<dyn ListingStore>,
    config: Arc<ScraperConfig>,
    extraction: Arc<ExtractionSettings>,
    gate: Arc<JobAdmissionGate>,
    last_batch: Mutex<Option<BatchSummary>>,
}

impl ScrapeService {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        store: Arc<dyn ListingStore>,
        config: ScraperConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            driver,
            store,
            extraction: Arc::new(ExtractionSettings::from(&config)),
            config: Arc::new(config),
            gate: JobAdmissionGate::new(),
            last_batch: Mutex::new(None),
        })
    }

    pub fn gate(&self) -> &Arc<JobAdmissionGate> {
        &self.gate
    }

    pub fn store(&self) -> &Arc<dyn ListingStore> {
        &self.store
    }

    pub fn last_batch(&self) -> Option<BatchSummary> {
        self.last_batch.lock().clone()
    }

    /// Validate, admit and start a batch
    ///
    /// Returns as soon as the batch holds the gate; scraping continues in the
    /// background.
    pub async fn submit(self: &Arc<Self>, request: ScrapeRequest) -> Result<BatchHandle, SubmitError> {
        let context = BatchContext::from_request(request)?;
        let ticket = self.gate.try_admit()?;

        info!(
            "Admitted batch {} '{}' with {} urls",
            context.id,
            context.name,
            context.urls.len()
        );

        let guard = ticket.enter().await;
        let batch_id = context.id;
        let service = Arc::clone(self);
        let task = tokio::spawn(async move { service.run_batch(context, guard).await });

        Ok(BatchHandle { batch_id, task })
    }

    async fn run_batch(&self, context: BatchContext, guard: RunGuard) -> BatchSummary {
        let started = Instant::now();
        let label = context.label();

        let primary = WorkerPool::new(
            Arc::clone(&self.driver),
            Arc::clone(&self.extraction),
            PoolSettings::new(
                label.clone(),
                self.config.primary_workers(),
                self.config.primary_task_delay(),
            ),
        );
        let mut reconciler =
            ResultReconciler::new(Arc::clone(&self.store), label.clone(), context.urls.len());

        let mut results = primary.run(context.tasks());
        reconciler.reconcile(Pass::Primary, &mut results).await;
        results.finished().await;

        let failed = reconciler.take_navigation_failures();
        if !failed.is_empty() {
            info!("{}: found {} failed links", label, failed.len());
            let retry = RetryCoordinator::new(
                Arc::clone(&self.driver),
                Arc::clone(&self.extraction),
                PoolSettings::new(
                    format!("Retry {label}"),
                    self.config.retry_workers(),
                    self.config.retry_task_delay(),
                ),
            );
            if let Some(mut results) = retry.run(failed, &context.selectors) {
                reconciler.reconcile(Pass::Retry, &mut results).await;
                results.finished().await;
            }
        }

        reconciler.record_final_failures().await;

        let run = reconciler.into_run();
        if run.unaccounted() > 0 {
            error!(
                "{}: {} of {} tasks produced no result",
                label,
                run.unaccounted(),
                run.total
            );
        }
        let elapsed = started.elapsed();
        info!(
            "{}: processed {}, saved {}, errors {}, elapsed {:?}",
            label, run.processed, run.saved, run.errors, elapsed
        );

        let summary = BatchSummary {
            batch_id: context.id,
            name: context.name,
            processed: run.processed,
            saved: run.saved,
            errors: run.errors,
            retried: run.retried,
            final_failures: run.final_failures(),
            started_at: context.started_at,
            elapsed,
        };

        // Visible to shared waiters as soon as the gate opens
        *self.last_batch.lock() = Some(summary.clone());
        drop(guard);
        summary
    }
}
