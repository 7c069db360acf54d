//! Listing persistence
//!
//! The batch pipeline only needs two writes: update one listing by reference,
//! and attach the batch's failed URLs to the latest scrape-info record.

pub mod postgres;

use async_trait::async_trait;

pub use postgres::PgListingStore;

/// Extracted fields written back to a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingUpdate {
    pub content: String,
    pub photos: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No listing has this reference
    #[error("no listing found with reference '{reference}'")]
    NotFound { reference: String },

    /// No scrape-info record to attach failed links to
    #[error("no scrape info record found")]
    NoScrapeInfo,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to encode photos: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Overwrite a listing's content and photos
    ///
    /// Returns `StoreError::NotFound` when no row matches `reference`.
    async fn update_listing(&self, reference: &str, update: &ListingUpdate) -> Result<(), StoreError>;

    /// Record the URLs that still failed at the end of a batch
    async fn record_failed_links(&self, links: &[String]) -> Result<(), StoreError>;

    /// Connectivity probe for health reporting
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
