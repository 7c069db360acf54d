//! Per-site extraction variants
//!
//! Most hosts go through the generic cascade driven by the batch's selectors.
//! One known host renders its photos inside a gallery that must be opened
//! first and uses fixed markup, so it gets its own path.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionSettings, cascade, reference::derive_reference};
use crate::batch::{ExtractionResult, ExtractionTask};
use crate::page_driver::{PageSession, WaitCondition};

/// Trailing path segment is the listing reference on the gallery host
static GALLERY_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([^/]+)$").expect("Invalid gallery reference regex"));

const GALLERY_DESCRIPTION: &str = "p.property-description_text__xdJhn";
const GALLERY_TOOLBAR: &str = "[class*='media-gallery-buttons_active__']";
const GALLERY_OPENER: &str = "[class*='multi-multimedia-gallery_mainGallery__XIX0x']";
const GALLERY_IMAGES: &str = "div.media-gallery-tour_galleryMosaic__n9mIr img";

/// Which extraction path a URL takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteProfile {
    Generic,
    Gallery,
}

impl SiteProfile {
    pub fn for_url(url: &str, gallery_marker: &str) -> Self {
        if !gallery_marker.is_empty() && url.contains(gallery_marker) {
            SiteProfile::Gallery
        } else {
            SiteProfile::Generic
        }
    }

    pub async fn extract(
        self,
        session: &mut dyn PageSession,
        task: &ExtractionTask,
        settings: &ExtractionSettings,
    ) -> ExtractionResult {
        match self {
            SiteProfile::Generic => extract_generic(session, task, settings).await,
            SiteProfile::Gallery => extract_gallery(session, task, settings).await,
        }
    }
}

async fn extract_generic(
    session: &mut dyn PageSession,
    task: &ExtractionTask,
    settings: &ExtractionSettings,
) -> ExtractionResult {
    let reference = derive_reference(&task.url, &task.selectors.reference);
    let mut result = ExtractionResult::new(&task.url, reference);

    if let Err(e) = session
        .navigate(&task.url, WaitCondition::NetworkIdle, settings.navigation_timeout)
        .await
    {
        debug!("Failed to navigate to {}: {}", task.url, e);
        result.error = Some(format!("failed to navigate: {e}"));
        return result;
    }

    result.content =
        cascade::first_content(session, &task.selectors.content, settings.selector_timeout).await;
    result.photos = cascade::first_photos(session, &task.selectors.photos).await;
    result
}

/// Fixed-markup path: load wait, description paragraph, then open the gallery
/// and collect the mosaic images
async fn extract_gallery(
    session: &mut dyn PageSession,
    task: &ExtractionTask,
    settings: &ExtractionSettings,
) -> ExtractionResult {
    let reference = derive_reference(&task.url, &GALLERY_REFERENCE);
    let mut result = ExtractionResult::new(&task.url, reference);

    if let Err(e) = session
        .navigate(&task.url, WaitCondition::Load, settings.gallery_navigation_timeout)
        .await
    {
        debug!("Failed to navigate to {}: {}", task.url, e);
        result.error = Some(format!("failed to navigate: {e}"));
        return result;
    }

    match session
        .query_first_text(GALLERY_DESCRIPTION, settings.selector_timeout)
        .await
    {
        Ok(Some(text)) => result.content = text.trim().to_string(),
        Ok(None) => {}
        Err(e) => debug!("No gallery description on {}: {}", task.url, e),
    }

    if let Err(e) = session
        .wait_for(GALLERY_TOOLBAR, settings.gallery_click_timeout)
        .await
    {
        debug!("Gallery toolbar not found on {}: {}", task.url, e);
    }

    if let Err(e) = session
        .click_first(GALLERY_OPENER, settings.gallery_click_timeout)
        .await
    {
        debug!("Could not open gallery on {}: {}", task.url, e);
        return result;
    }

    tokio::time::sleep(settings.gallery_settle_delay).await;

    match session.query_all_attribute(GALLERY_IMAGES, "src").await {
        Ok(sources) => result.photos = cascade::absolute_sources(sources),
        Err(e) => debug!("Failed to enumerate gallery images on {}: {}", task.url, e),
    }
    result
}
