//! Shared configuration constants for the listing scraper
//!
//! Default values used by the config builder, the worker pools and the
//! extraction routine, kept here to avoid magic numbers.

use std::time::Duration;

/// Primary pass: number of concurrent browser workers
pub const PRIMARY_WORKERS: usize = 10;

/// Primary pass: pause after each task before a worker pulls the next one
pub const PRIMARY_TASK_DELAY: Duration = Duration::from_millis(100);

/// Retry pass: number of concurrent browser workers
///
/// Smaller than the primary pool so a rate-limiting host sees less pressure
/// on the second attempt.
pub const RETRY_WORKERS: usize = 5;

/// Retry pass: pause after each task
pub const RETRY_TASK_DELAY: Duration = Duration::from_millis(200);

/// Navigation timeout for the generic extraction path (network-idle wait)
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Navigation timeout for the gallery host path (load-event wait)
pub const GALLERY_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(6);

/// Timeout for reading the first match of a single content selector
pub const SELECTOR_TIMEOUT: Duration = Duration::from_secs(3);

/// Timeout for clicking the gallery opener on the gallery host path
pub const GALLERY_CLICK_TIMEOUT: Duration = Duration::from_secs(10);

/// Settle time after opening the gallery before images are enumerated
pub const GALLERY_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// URL marker that routes a task to the gallery host path
pub const GALLERY_HOST_MARKER: &str = "bonavista";

/// Default HTTP port when `PORT` is unset
pub const DEFAULT_PORT: u16 = 8080;

/// Default size of the Postgres connection pool
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
