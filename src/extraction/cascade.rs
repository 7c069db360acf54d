//! Selector cascades
//!
//! Ordered fallback over caller-supplied selectors: the first selector that
//! yields something wins and the rest are skipped. A selector that errors or
//! times out is treated as "no match".

use log::trace;
use std::time::Duration;
use url::Url;

use crate::page_driver::PageSession;

/// Trimmed text of the first content selector that yields non-whitespace text
pub async fn first_content(
    session: &mut dyn PageSession,
    selectors: &[String],
    timeout: Duration,
) -> String {
    for selector in selectors {
        match session.query_first_text(selector, timeout).await {
            Ok(Some(text)) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
                trace!("Content selector '{}' matched only whitespace", selector);
            }
            Ok(None) => trace!("Content selector '{}' matched an element without text", selector),
            Err(e) => trace!("Content selector '{}' skipped: {}", selector, e),
        }
    }
    String::new()
}

/// Image sources of the first photo selector that yields at least one absolute URL
pub async fn first_photos(session: &mut dyn PageSession, selectors: &[String]) -> Vec<String> {
    for selector in selectors {
        match session.query_all_attribute(selector, "src").await {
            Ok(sources) => {
                let photos = absolute_sources(sources);
                if !photos.is_empty() {
                    return photos;
                }
                trace!("Photo selector '{}' yielded no absolute sources", selector);
            }
            Err(e) => trace!("Photo selector '{}' skipped: {}", selector, e),
        }
    }
    Vec::new()
}

/// Keep `http(s)` URLs, in enumeration order
pub fn absolute_sources(sources: Vec<Option<String>>) -> Vec<String> {
    sources
        .into_iter()
        .flatten()
        .filter(|src| is_absolute_http_url(src))
        .collect()
}

fn is_absolute_http_url(src: &str) -> bool {
    Url::parse(src).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}
