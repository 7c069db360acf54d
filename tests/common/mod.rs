//! Test doubles shared by the integration tests
//!
//! `ScriptedDriver` stands in for Chromium: pages are tables of
//! selector -> text / `src` values, and navigation outcomes are scripted per
//! URL. `RecordingStore` is an in-memory `ListingStore` that records calls.

use async_trait::async_trait;
use listing_scraper::{
    BatchSelectors, DriverError, ExtractionTask, ListingStore, ListingUpdate, PageDriver,
    PageSession, ScrapeRequest, ScraperConfig, SelectorConfig, StoreError, WaitCondition,
};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// =============================================================================
// ScriptedDriver
// =============================================================================

/// One scripted page
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    texts: HashMap<String, Option<String>>,
    sources: HashMap<String, Vec<Option<String>>>,
    clickable: HashSet<String>,
}

#[allow(dead_code)]
impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// `selector` matches an element with this inner text
    pub fn text(mut self, selector: &str, text: &str) -> Self {
        self.texts.insert(selector.to_string(), Some(text.to_string()));
        self
    }

    /// `selector` matches an element that exposes no text
    pub fn textless(mut self, selector: &str) -> Self {
        self.texts.insert(selector.to_string(), None);
        self
    }

    /// `selector` matches elements with these `src` attributes
    pub fn sources(mut self, selector: &str, sources: &[&str]) -> Self {
        self.sources.insert(
            selector.to_string(),
            sources.iter().map(|s| Some(s.to_string())).collect(),
        );
        self
    }

    pub fn clickable(mut self, selector: &str) -> Self {
        self.clickable.insert(selector.to_string());
        self
    }

    fn has(&self, selector: &str) -> bool {
        self.texts.contains_key(selector)
            || self.sources.contains_key(selector)
            || self.clickable.contains(selector)
    }
}

/// One recorded navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub session: usize,
    pub url: String,
    pub wait: WaitCondition,
    pub timeout: Duration,
}

#[derive(Default)]
struct DriverState {
    pages: Mutex<HashMap<String, FakePage>>,
    navigation_failures: Mutex<HashMap<String, usize>>,
    session_failures: AtomicUsize,
    navigation_delay: Mutex<Duration>,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    navigations: Mutex<Vec<Navigation>>,
    clicks: Mutex<Vec<(usize, String)>>,
}

#[derive(Clone, Default)]
pub struct ScriptedDriver {
    state: Arc<DriverState>,
}

#[allow(dead_code)]
impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, page: FakePage) -> Self {
        self.state.pages.lock().insert(url.to_string(), page);
        self
    }

    /// The next `times` navigations to `url` time out
    pub fn fail_navigation(self, url: &str, times: usize) -> Self {
        self.state
            .navigation_failures
            .lock()
            .insert(url.to_string(), times);
        self
    }

    /// The next `n` session opens fail
    pub fn fail_sessions(self, n: usize) -> Self {
        self.state.session_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Every successful navigation takes this long
    pub fn navigation_delay(self, delay: Duration) -> Self {
        *self.state.navigation_delay.lock() = delay;
        self
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.sessions_closed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.state.navigations.lock().clone()
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations().iter().filter(|n| n.url == url).count()
    }

    pub fn clicks(&self) -> Vec<(usize, String)> {
        self.state.clicks.lock().clone()
    }

    pub fn into_driver(self) -> Arc<dyn PageDriver> {
        Arc::new(self)
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn open_session(&self) -> Result<Box<dyn PageSession>, DriverError> {
        let failed = self
            .state
            .session_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(DriverError::Session("scripted session failure".to_string()));
        }
        let id = self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            id,
            state: Arc::clone(&self.state),
            current: None,
        }))
    }
}

struct ScriptedSession {
    id: usize,
    state: Arc<DriverState>,
    current: Option<FakePage>,
}

fn not_found(selector: &str, timeout: Duration) -> DriverError {
    DriverError::Timeout {
        operation: format!("Waiting for '{selector}'"),
        timeout,
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn navigate(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.state.navigations.lock().push(Navigation {
            session: self.id,
            url: url.to_string(),
            wait,
            timeout,
        });
        self.current = None;

        let scripted_failure = {
            let mut failures = self.state.navigation_failures.lock();
            match failures.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if scripted_failure {
            return Err(DriverError::Timeout {
                operation: "Page navigation".to_string(),
                timeout,
            });
        }

        let page = self
            .state
            .pages
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| DriverError::Navigation(format!("net::ERR_NAME_NOT_RESOLVED at {url}")))?;

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.state.navigation_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.current = Some(page);
        Ok(())
    }

    async fn query_first_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, DriverError> {
        self.current
            .as_ref()
            .and_then(|page| page.texts.get(selector).cloned())
            .ok_or_else(|| not_found(selector, timeout))
    }

    async fn query_all_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>, DriverError> {
        assert_eq!(attribute, "src");
        Ok(self
            .current
            .as_ref()
            .and_then(|page| page.sources.get(selector).cloned())
            .unwrap_or_default())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        match &self.current {
            Some(page) if page.has(selector) => Ok(()),
            _ => Err(not_found(selector, timeout)),
        }
    }

    async fn click_first(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        match &self.current {
            Some(page) if page.clickable.contains(selector) => {
                self.state.clicks.lock().push((self.id, selector.to_string()));
                Ok(())
            }
            _ => Err(not_found(selector, timeout)),
        }
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.current = None;
        self.state.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// RecordingStore
// =============================================================================

#[derive(Default)]
pub struct RecordingStore {
    known: Mutex<HashSet<String>>,
    updates: Mutex<Vec<(String, ListingUpdate)>>,
    recorded: Mutex<Vec<Vec<String>>>,
    fail_recording: bool,
}

#[allow(dead_code)]
impl RecordingStore {
    /// Store containing listings with these references
    pub fn with_listings(references: &[&str]) -> Self {
        Self {
            known: Mutex::new(references.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    /// `record_failed_links` always fails
    pub fn failing_recording(mut self) -> Self {
        self.fail_recording = true;
        self
    }

    pub fn updates(&self) -> Vec<(String, ListingUpdate)> {
        self.updates.lock().clone()
    }

    pub fn update_for(&self, reference: &str) -> Option<ListingUpdate> {
        self.updates
            .lock()
            .iter()
            .find(|(r, _)| r == reference)
            .map(|(_, u)| u.clone())
    }

    pub fn recorded(&self) -> Vec<Vec<String>> {
        self.recorded.lock().clone()
    }
}

#[async_trait]
impl ListingStore for RecordingStore {
    async fn update_listing(&self, reference: &str, update: &ListingUpdate) -> Result<(), StoreError> {
        if !self.known.lock().contains(reference) {
            return Err(StoreError::NotFound {
                reference: reference.to_string(),
            });
        }
        self.updates
            .lock()
            .push((reference.to_string(), update.clone()));
        Ok(())
    }

    async fn record_failed_links(&self, links: &[String]) -> Result<(), StoreError> {
        self.recorded.lock().push(links.to_vec());
        if self.fail_recording {
            return Err(StoreError::NoScrapeInfo);
        }
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const CONTENT: &str = "p.description";
pub const PHOTOS: &str = "div.gallery img";
pub const REFERENCE: &str = r"/listing/([^/?]+)";

/// `https://homes.test/listing/<reference>`
#[allow(dead_code)]
pub fn listing_url(reference: &str) -> String {
    format!("https://homes.test/listing/{reference}")
}

/// A page with a description and two photos
#[allow(dead_code)]
pub fn listing_page(reference: &str) -> FakePage {
    let first = format!("https://cdn.homes.test/{reference}/1.jpg");
    let second = format!("https://cdn.homes.test/{reference}/2.jpg");
    FakePage::new()
        .text(CONTENT, &format!("  Listing {reference}  "))
        .sources(PHOTOS, &[first.as_str(), second.as_str()])
}

#[allow(dead_code)]
pub fn selector_config() -> SelectorConfig {
    SelectorConfig {
        content: vec![CONTENT.to_string()],
        photos: vec![PHOTOS.to_string()],
        reference: REFERENCE.to_string(),
        carousel_photos: None,
    }
}

#[allow(dead_code)]
pub fn selectors(content: &[&str], photos: &[&str]) -> Arc<BatchSelectors> {
    Arc::new(BatchSelectors {
        content: content.iter().map(|s| s.to_string()).collect(),
        photos: photos.iter().map(|s| s.to_string()).collect(),
        reference: Regex::new(REFERENCE).unwrap(),
        carousel: None,
    })
}

#[allow(dead_code)]
pub fn task(url: &str, selectors: &Arc<BatchSelectors>) -> ExtractionTask {
    ExtractionTask {
        url: url.to_string(),
        selectors: Arc::clone(selectors),
    }
}

#[allow(dead_code)]
pub fn request(name: &str, urls: &[String]) -> ScrapeRequest {
    ScrapeRequest {
        name: name.to_string(),
        urls: urls.to_vec(),
        selectors: selector_config(),
    }
}

/// Small pools, no throttling, short timeouts
#[allow(dead_code)]
pub fn test_config() -> ScraperConfig {
    ScraperConfig::builder()
        .primary_pool(3, Duration::ZERO)
        .retry_pool(2, Duration::ZERO)
        .navigation_timeout(Duration::from_millis(500))
        .selector_timeout(Duration::from_millis(50))
        .gallery_timings(Duration::from_millis(50), Duration::from_millis(1))
        .build()
        .unwrap()
}
