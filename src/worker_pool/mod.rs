//! Fixed-size browser worker pool
//!
//! All tasks are loaded into a shared queue before any worker starts. Each of
//! the N workers opens one isolated session, drains the queue one task at a
//! time, and sends exactly one `ExtractionResult` per task on a shared
//! channel. A supervisor joins every worker and only then closes the channel,
//! so the stream ends exactly when the pool is done. Consumers may read
//! results while scraping is still in flight.

use crossbeam_queue::SegQueue;
use futures::Stream;
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::batch::{ExtractionResult, ExtractionTask};
use crate::extraction::{ExtractionSettings, derive_reference, extract_listing};
use crate::page_driver::PageDriver;

/// Error attached to tasks left in the queue after every worker exited
pub const NO_SESSION_ERROR: &str = "no browsing session available";

/// Size, throttle and log label of one pool
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub label: String,
    pub workers: usize,
    pub task_delay: Duration,
}

impl PoolSettings {
    pub fn new(label: impl Into<String>, workers: usize, task_delay: Duration) -> Self {
        Self {
            label: label.into(),
            workers,
            task_delay,
        }
    }
}

pub struct WorkerPool {
    driver: Arc<dyn PageDriver>,
    extraction: Arc<ExtractionSettings>,
    settings: PoolSettings,
}

impl WorkerPool {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        extraction: Arc<ExtractionSettings>,
        settings: PoolSettings,
    ) -> Self {
        Self {
            driver,
            extraction,
            settings,
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Start the workers and return the result stream
    ///
    /// The stream yields exactly one result per task, in completion order,
    /// and ends after every worker has exited.
    pub fn run(&self, tasks: Vec<ExtractionTask>) -> ResultStream {
        let total = tasks.len();
        let queue = Arc::new(SegQueue::new());
        for task in tasks {
            queue.push(task);
        }

        // One slot per task: workers never wait on the consumer
        let (tx, rx) = mpsc::channel(total.max(1));

        info!(
            "{}: starting {} workers for {} tasks",
            self.settings.label, self.settings.workers, total
        );

        let workers: Vec<JoinHandle<()>> = (0..self.settings.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    label: self.settings.label.clone(),
                    task_delay: self.settings.task_delay,
                    driver: Arc::clone(&self.driver),
                    extraction: Arc::clone(&self.extraction),
                    queue: Arc::clone(&queue),
                    results: tx.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        let label = self.settings.label.clone();
        let supervisor = tokio::spawn(async move {
            for (id, joined) in join_all(workers).await.into_iter().enumerate() {
                if let Err(e) = joined {
                    error!("{} {}: worker aborted: {}", label, id, e);
                }
            }

            // Only non-empty when workers could not open sessions
            let mut orphaned = 0usize;
            while let Some(task) = queue.pop() {
                orphaned += 1;
                let reference = derive_reference(&task.url, &task.selectors.reference);
                if tx
                    .send(ExtractionResult::failed(task.url, reference, NO_SESSION_ERROR))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            if orphaned > 0 {
                warn!("{}: {} tasks had no worker session", label, orphaned);
            }
            debug!("{}: all workers exited", label);
        });

        ResultStream {
            inner: ReceiverStream::new(rx),
            supervisor,
        }
    }
}

struct Worker {
    id: usize,
    label: String,
    task_delay: Duration,
    driver: Arc<dyn PageDriver>,
    extraction: Arc<ExtractionSettings>,
    queue: Arc<SegQueue<ExtractionTask>>,
    results: mpsc::Sender<ExtractionResult>,
}

impl Worker {
    async fn run(self) {
        let mut session = match self.driver.open_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("{} {}: could not open browsing session: {}", self.label, self.id, e);
                return;
            }
        };

        let mut handled = 0usize;
        while let Some(task) = self.queue.pop() {
            let result = extract_listing(session.as_mut(), &task, &self.extraction).await;
            handled += 1;
            if self.results.send(result).await.is_err() {
                warn!("{} {}: result stream closed, stopping", self.label, self.id);
                break;
            }
            tokio::time::sleep(self.task_delay).await;
        }

        if let Err(e) = session.close().await {
            debug!("{} {}: failed to close session: {}", self.label, self.id, e);
        }
        debug!("{} {}: done after {} tasks", self.label, self.id, handled);
    }
}

/// Results of one pool run, in completion order
pub struct ResultStream {
    inner: ReceiverStream<ExtractionResult>,
    supervisor: JoinHandle<()>,
}

impl ResultStream {
    /// Wait for the supervisor after the stream has been drained
    pub async fn finished(self) {
        if let Err(e) = self.supervisor.await {
            error!("Worker pool supervisor failed: {}", e);
        }
    }
}

impl Stream for ResultStream {
    type Item = ExtractionResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
