//! Accessors for `ScraperConfig`

use std::path::Path;
use std::time::Duration;

use super::types::ScraperConfig;

impl ScraperConfig {
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chromium_path(&self) -> Option<&Path> {
        self.chromium_path.as_deref()
    }

    #[must_use]
    pub fn primary_workers(&self) -> usize {
        self.primary_workers
    }

    #[must_use]
    pub fn primary_task_delay(&self) -> Duration {
        self.primary_task_delay
    }

    #[must_use]
    pub fn retry_workers(&self) -> usize {
        self.retry_workers
    }

    #[must_use]
    pub fn retry_task_delay(&self) -> Duration {
        self.retry_task_delay
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout
    }

    #[must_use]
    pub fn gallery_navigation_timeout(&self) -> Duration {
        self.gallery_navigation_timeout
    }

    #[must_use]
    pub fn selector_timeout(&self) -> Duration {
        self.selector_timeout
    }

    #[must_use]
    pub fn gallery_click_timeout(&self) -> Duration {
        self.gallery_click_timeout
    }

    #[must_use]
    pub fn gallery_settle_delay(&self) -> Duration {
        self.gallery_settle_delay
    }

    #[must_use]
    pub fn gallery_host_marker(&self) -> &str {
        &self.gallery_host_marker
    }
}
