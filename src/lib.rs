pub mod admission;
pub mod batch;
pub mod browser_profile;
pub mod browser_setup;
pub mod config;
pub mod extraction;
pub mod page_driver;
pub mod page_timeout;
pub mod reconciler;
pub mod retry;
pub mod server;
pub mod store;
pub mod utils;
pub mod worker_pool;

pub use admission::{AdmissionError, AdmissionTicket, JobAdmissionGate, RunGuard};
pub use batch::{
    BatchContext, BatchHandle, BatchSelectors, BatchSummary, CarouselSelectors, ExtractionResult,
    ExtractionTask, ScrapeRequest, ScrapeService, SelectorConfig, SubmitError,
};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{ConfigError, ScraperConfig};
pub use extraction::{ExtractionSettings, SiteProfile, extract_listing};
pub use page_driver::{ChromiumDriver, DriverError, PageDriver, PageSession, WaitCondition};
pub use reconciler::{BatchRun, Outcome, Pass, PassOutcome, ResultReconciler};
pub use retry::RetryCoordinator;
pub use store::{ListingStore, ListingUpdate, PgListingStore, StoreError};
pub use worker_pool::{PoolSettings, ResultStream, WorkerPool};
