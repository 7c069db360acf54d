//! Chromium-backed page driver
//!
//! One shared browser process; each session is a fresh CDP browser context
//! (incognito-like: separate cookies, storage and cache) with a single page.

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{DriverError, PageDriver, PageSession, WaitCondition};
use crate::browser_profile::{BrowserProfile, create_unique_profile_with_prefix};
use crate::browser_setup::launch_browser;
use crate::config::ScraperConfig;
use crate::page_timeout::with_page_timeout;

/// Poll interval while waiting for selectors and page readiness
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the resource count must stay unchanged to count as network idle
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

const READY_STATE_JS: &str = "document.readyState";
const RESOURCE_COUNT_JS: &str = "performance.getEntriesByType('resource').length";

impl From<CdpError> for DriverError {
    fn from(e: CdpError) -> Self {
        DriverError::Protocol(e.to_string())
    }
}

/// Page driver backed by a single launched Chromium process
pub struct ChromiumDriver {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    profile: BrowserProfile,
}

impl ChromiumDriver {
    /// Find or download Chromium and launch it with a throwaway profile
    pub async fn launch(config: &ScraperConfig) -> Result<Self, DriverError> {
        let profile = create_unique_profile_with_prefix("listing_scraper_chrome")
            .map_err(|e| DriverError::Launch(format!("{e:#}")))?;

        let (browser, handler) = launch_browser(
            config.headless(),
            config.chromium_path(),
            profile.path().to_path_buf(),
        )
        .await
        .map_err(|e| DriverError::Launch(format!("{e:#}")))?;

        info!(
            "Chromium ready (headless: {}, profile: {})",
            config.headless(),
            profile.path().display()
        );

        Ok(Self {
            browser: Arc::new(browser),
            handler,
            profile,
        })
    }

    /// Close the browser, stop the CDP handler and remove the profile directory
    ///
    /// If sessions still hold the browser, the process is left to be killed on
    /// drop.
    pub async fn shutdown(self) {
        let ChromiumDriver {
            browser,
            handler,
            profile,
        } = self;

        match Arc::try_unwrap(browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                if let Err(e) = browser.wait().await {
                    warn!("Failed to wait for browser exit: {}", e);
                }
            }
            Err(_) => warn!("Browser still referenced by open sessions, skipping graceful close"),
        }

        handler.abort();
        drop(profile);
        info!("Chromium shut down");
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn open_session(&self) -> Result<Box<dyn PageSession>, DriverError> {
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| DriverError::Session(e.to_string()))?
            .result
            .browser_context_id;

        let page = match self.browser.new_page(blank_target_in(context_id.clone())).await {
            Ok(page) => page,
            Err(e) => {
                dispose_context(&self.browser, context_id).await;
                return Err(DriverError::Session(e.to_string()));
            }
        };

        debug!("Opened isolated browser context {:?}", context_id);

        Ok(Box::new(ChromiumSession {
            browser: Arc::clone(&self.browser),
            page: Some(page),
            context_id: Some(context_id),
        }))
    }
}

/// Blank page opened inside `context_id`
fn blank_target_in(context_id: BrowserContextId) -> CreateTargetParams {
    let mut target = CreateTargetParams::new("about:blank");
    target.browser_context_id = Some(context_id);
    target
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        debug!("Failed to dispose browser context: {}", e);
    }
}

/// One isolated Chromium browser context with a single page
pub struct ChromiumSession {
    browser: Arc<Browser>,
    page: Option<Page>,
    context_id: Option<BrowserContextId>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, DriverError> {
        self.page
            .as_ref()
            .ok_or_else(|| DriverError::Session("session already closed".to_string()))
    }

    /// Poll until `selector` matches or `timeout` elapses
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<Element, DriverError> {
        let page = self.page()?;
        let poll = async {
            loop {
                if let Ok(element) = page.find_element(selector).await {
                    return Ok::<_, DriverError>(element);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        with_page_timeout(poll, timeout, &format!("Waiting for '{selector}'")).await
    }
}

async fn evaluate_value<T: serde::de::DeserializeOwned>(page: &Page, script: &str) -> Result<T, DriverError> {
    page.evaluate(script)
        .await?
        .into_value()
        .map_err(|e| DriverError::Protocol(format!("Failed to read `{script}` result: {e}")))
}

/// Wait for `document.readyState == "complete"` and a quiet resource count
async fn wait_for_network_idle(page: &Page) -> Result<(), DriverError> {
    while evaluate_value::<String>(page, READY_STATE_JS).await? != "complete" {
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    let mut last_count: u64 = evaluate_value(page, RESOURCE_COUNT_JS).await?;
    loop {
        tokio::time::sleep(NETWORK_QUIET_WINDOW).await;
        let count: u64 = evaluate_value(page, RESOURCE_COUNT_JS).await?;
        if count == last_count {
            return Ok(());
        }
        last_count = count;
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let page = self.page()?;
        let navigation = async {
            page.goto(url)
                .await
                .map_err(|e| DriverError::Navigation(e.to_string()))?;
            if wait == WaitCondition::NetworkIdle {
                wait_for_network_idle(page).await?;
            }
            Ok(())
        };
        with_page_timeout(navigation, timeout, "Page navigation").await
    }

    async fn query_first_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, DriverError> {
        let element = self.wait_for_element(selector, timeout).await?;
        Ok(element.inner_text().await?)
    }

    async fn query_all_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>, DriverError> {
        let elements = self.page()?.find_elements(selector).await?;
        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            values.push(element.attribute(attribute).await?);
        }
        Ok(values)
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        self.wait_for_element(selector, timeout).await.map(|_| ())
    }

    async fn click_first(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        let element = self.wait_for_element(selector, timeout).await?;
        element.click().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            debug!("Failed to close page: {}", e);
        }
        if let Some(context_id) = self.context_id.take() {
            dispose_context(&self.browser, context_id).await;
        }
        Ok(())
    }
}
