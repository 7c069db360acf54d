//! Fluent builder for `ScraperConfig`
//!
//! Every field has a default; `build()` validates that worker counts and
//! timeouts are non-zero.

use std::path::PathBuf;
use std::time::Duration;

use super::types::{ConfigError, ScraperConfig};
use crate::utils::constants::{
    DEFAULT_DB_MAX_CONNECTIONS, DEFAULT_PORT, GALLERY_CLICK_TIMEOUT, GALLERY_HOST_MARKER,
    GALLERY_NAVIGATION_TIMEOUT, GALLERY_SETTLE_DELAY, NAVIGATION_TIMEOUT, PRIMARY_TASK_DELAY,
    PRIMARY_WORKERS, RETRY_TASK_DELAY, RETRY_WORKERS, SELECTOR_TIMEOUT,
};

#[derive(Debug, Clone)]
pub struct ScraperConfigBuilder {
    config: ScraperConfig,
}

impl Default for ScraperConfigBuilder {
    fn default() -> Self {
        Self {
            config: ScraperConfig {
                port: DEFAULT_PORT,
                database_url: None,
                db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
                headless: true,
                chromium_path: None,
                primary_workers: PRIMARY_WORKERS,
                primary_task_delay: PRIMARY_TASK_DELAY,
                retry_workers: RETRY_WORKERS,
                retry_task_delay: RETRY_TASK_DELAY,
                navigation_timeout: NAVIGATION_TIMEOUT,
                gallery_navigation_timeout: GALLERY_NAVIGATION_TIMEOUT,
                selector_timeout: SELECTOR_TIMEOUT,
                gallery_click_timeout: GALLERY_CLICK_TIMEOUT,
                gallery_settle_delay: GALLERY_SETTLE_DELAY,
                gallery_host_marker: GALLERY_HOST_MARKER.to_string(),
            },
        }
    }
}

impl ScraperConfig {
    /// Create a builder pre-filled with production defaults
    #[must_use]
    pub fn builder() -> ScraperConfigBuilder {
        ScraperConfigBuilder::default()
    }
}

impl ScraperConfigBuilder {
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn db_max_connections(mut self, n: u32) -> Self {
        self.config.db_max_connections = n;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chromium_path = Some(path.into());
        self
    }

    /// Primary pool size and inter-task throttle
    #[must_use]
    pub fn primary_pool(mut self, workers: usize, task_delay: Duration) -> Self {
        self.config.primary_workers = workers;
        self.config.primary_task_delay = task_delay;
        self
    }

    /// Retry pool size and inter-task throttle
    #[must_use]
    pub fn retry_pool(mut self, workers: usize, task_delay: Duration) -> Self {
        self.config.retry_workers = workers;
        self.config.retry_task_delay = task_delay;
        self
    }

    #[must_use]
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.config.navigation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn gallery_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.config.gallery_navigation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn selector_timeout(mut self, timeout: Duration) -> Self {
        self.config.selector_timeout = timeout;
        self
    }

    /// Click timeout and post-click pause on the gallery path
    #[must_use]
    pub fn gallery_timings(mut self, click_timeout: Duration, settle_delay: Duration) -> Self {
        self.config.gallery_click_timeout = click_timeout;
        self.config.gallery_settle_delay = settle_delay;
        self
    }

    #[must_use]
    pub fn gallery_host_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.gallery_host_marker = marker.into();
        self
    }

    pub fn build(self) -> Result<ScraperConfig, ConfigError> {
        let config = self.config;

        let counts = [
            ("primary_workers", config.primary_workers),
            ("retry_workers", config.retry_workers),
            ("db_max_connections", config.db_max_connections as usize),
        ];
        if let Some((field, _)) = counts.iter().find(|(_, n)| *n == 0) {
            return Err(ConfigError::Zero { field: *field });
        }

        let timeouts = [
            ("navigation_timeout", config.navigation_timeout),
            ("gallery_navigation_timeout", config.gallery_navigation_timeout),
            ("selector_timeout", config.selector_timeout),
            ("gallery_click_timeout", config.gallery_click_timeout),
        ];
        if let Some((field, _)) = timeouts.iter().find(|(_, t)| t.is_zero()) {
            return Err(ConfigError::Zero { field: *field });
        }

        Ok(config)
    }
}
