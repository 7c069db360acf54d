//! Per-task extraction routine
//!
//! Runs inside a worker's session: derive the reference, navigate, then run
//! the content and photo cascades. Only a navigation failure sets
//! `ExtractionResult::error`; selectors that match nothing leave the fields
//! empty.

pub mod cascade;
pub mod profile;
pub mod reference;

use std::time::Duration;

use crate::batch::{ExtractionResult, ExtractionTask};
use crate::config::ScraperConfig;
use crate::page_driver::PageSession;

pub use profile::SiteProfile;
pub use reference::derive_reference;

/// Timeouts and routing for the extraction routine
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub navigation_timeout: Duration,
    pub gallery_navigation_timeout: Duration,
    pub selector_timeout: Duration,
    pub gallery_click_timeout: Duration,
    pub gallery_settle_delay: Duration,
    pub gallery_host_marker: String,
}

impl From<&ScraperConfig> for ExtractionSettings {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            navigation_timeout: config.navigation_timeout(),
            gallery_navigation_timeout: config.gallery_navigation_timeout(),
            selector_timeout: config.selector_timeout(),
            gallery_click_timeout: config.gallery_click_timeout(),
            gallery_settle_delay: config.gallery_settle_delay(),
            gallery_host_marker: config.gallery_host_marker().to_string(),
        }
    }
}

/// Extract one listing page; always returns exactly one result
pub async fn extract_listing(
    session: &mut dyn PageSession,
    task: &ExtractionTask,
    settings: &ExtractionSettings,
) -> ExtractionResult {
    SiteProfile::for_url(&task.url, &settings.gallery_host_marker)
        .extract(session, task, settings)
        .await
}
