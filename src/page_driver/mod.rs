//! Page rendering capability
//!
//! The extraction routine only ever talks to a [`PageSession`] obtained from a
//! [`PageDriver`]. The production implementation drives Chromium over CDP
//! ([`ChromiumDriver`]); tests substitute scripted drivers.

pub mod chromium;

use async_trait::async_trait;
use std::time::Duration;

pub use chromium::{ChromiumDriver, ChromiumSession};

/// Page readiness condition a navigation waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// The `load` event has fired
    Load,
    /// The document is complete and no new network resources appeared for a quiet window
    NetworkIdle,
}

/// Errors raised by page drivers and sessions
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Browser process could not be started or reached
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// Isolated browsing session could not be created
    #[error("Failed to open browsing session: {0}")]
    Session(String),

    /// Operation exceeded its deadline
    #[error("{operation} timeout after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    /// Page could not be loaded
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Any other browser protocol failure
    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

/// Factory for isolated browsing sessions
///
/// Every session must have its own cookie jar and storage: state created while
/// one worker renders a page must never be visible to another worker.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Open a new isolated session with a single blank page
    async fn open_session(&self) -> Result<Box<dyn PageSession>, DriverError>;
}

/// One isolated browsing session, exclusively owned by one worker
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to `url`, waiting for `wait` at most `timeout`
    async fn navigate(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Inner text of the first element matching `selector`
    ///
    /// Waits up to `timeout` for the element to appear. `Ok(None)` means the
    /// element exists but exposes no text.
    async fn query_first_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, DriverError>;

    /// `attribute` of every element matching `selector`, in document order
    ///
    /// Does not wait: an empty vector means nothing matched right now.
    async fn query_all_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>, DriverError>;

    /// Wait until an element matching `selector` is present
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Click the first element matching `selector`
    async fn click_first(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Release the session's page and browser context
    async fn close(&mut self) -> Result<(), DriverError>;
}
