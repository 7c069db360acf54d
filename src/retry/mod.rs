//! Second pass over navigation failures
//!
//! Rebuilds tasks for the primary pass's navigation-failed URLs with the same
//! selectors and runs them through a smaller, slower pool.

use log::info;
use std::sync::Arc;

use crate::batch::{BatchSelectors, ExtractionTask};
use crate::extraction::ExtractionSettings;
use crate::page_driver::PageDriver;
use crate::worker_pool::{PoolSettings, ResultStream, WorkerPool};

pub struct RetryCoordinator {
    pool: WorkerPool,
}

impl RetryCoordinator {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        extraction: Arc<ExtractionSettings>,
        settings: PoolSettings,
    ) -> Self {
        Self {
            pool: WorkerPool::new(driver, extraction, settings),
        }
    }

    /// Start the retry pool, or `None` when there is nothing to retry
    pub fn run(&self, urls: Vec<String>, selectors: &Arc<BatchSelectors>) -> Option<ResultStream> {
        if urls.is_empty() {
            return None;
        }
        info!(
            "{}: retrying {} failed links",
            self.pool.settings().label,
            urls.len()
        );
        Some(self.pool.run(ExtractionTask::for_urls(urls, selectors)))
    }
}
