//! Core configuration types

use std::path::PathBuf;
use std::time::Duration;

/// Process-wide scraper configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub(crate) port: u16,
    pub(crate) database_url: Option<String>,
    pub(crate) db_max_connections: u32,

    pub(crate) headless: bool,
    pub(crate) chromium_path: Option<PathBuf>,

    pub(crate) primary_workers: usize,
    pub(crate) primary_task_delay: Duration,
    pub(crate) retry_workers: usize,
    pub(crate) retry_task_delay: Duration,

    pub(crate) navigation_timeout: Duration,
    pub(crate) gallery_navigation_timeout: Duration,
    pub(crate) selector_timeout: Duration,
    pub(crate) gallery_click_timeout: Duration,
    pub(crate) gallery_settle_delay: Duration,
    /// URLs containing this marker take the gallery extraction path
    pub(crate) gallery_host_marker: String,
}

/// Configuration errors, raised by the builder and the environment loader
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Missing database configuration: set DATABASE_URL or {0}")]
    MissingDatabase(&'static str),
}
