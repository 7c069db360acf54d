//! Batches: data model and orchestration

pub mod service;
pub mod types;

pub use service::{BatchHandle, ScrapeService};
pub use types::{
    BatchContext, BatchSelectors, BatchSummary, CarouselSelectors, ExtractionResult,
    ExtractionTask, ScrapeRequest, SelectorConfig, SubmitError,
};
