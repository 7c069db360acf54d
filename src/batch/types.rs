//! Batch data model
//!
//! Wire types (`ScrapeRequest`, `SelectorConfig`) are validated once into a
//! `BatchContext`, which is the only place workers and the reconciler read
//! batch settings from.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Thumbnail/full-size selector pair for carousel-style galleries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselSelectors {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub full: Vec<String>,
}

/// Selector configuration as submitted with a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Content selectors, tried in order
    #[serde(default)]
    pub content: Vec<String>,
    /// Photo selectors (elements carrying a `src`), tried in order
    #[serde(default)]
    pub photos: Vec<String>,
    /// Regex whose first capture group is the listing reference
    #[serde(default, rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_photos: Option<CarouselSelectors>,
}

/// Body of a batch submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Submission rejected before any work was scheduled
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("No URLs provided")]
    EmptyUrls,

    #[error("No selectors provided: at least one content or photo selector is required")]
    NoSelectors,

    #[error("Invalid reference pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("A scrape job is already running")]
    Busy,
}

impl From<crate::admission::AdmissionError> for SubmitError {
    fn from(_: crate::admission::AdmissionError) -> Self {
        SubmitError::Busy
    }
}

/// Validated selectors with the reference pattern compiled
#[derive(Debug, Clone)]
pub struct BatchSelectors {
    pub content: Vec<String>,
    pub photos: Vec<String>,
    pub reference: Regex,
    pub carousel: Option<CarouselSelectors>,
}

impl TryFrom<SelectorConfig> for BatchSelectors {
    type Error = SubmitError;

    fn try_from(config: SelectorConfig) -> Result<Self, Self::Error> {
        if config.content.is_empty() && config.photos.is_empty() {
            return Err(SubmitError::NoSelectors);
        }
        let reference = Regex::new(&config.reference).map_err(|source| {
            SubmitError::InvalidPattern {
                pattern: config.reference.clone(),
                source,
            }
        })?;
        Ok(Self {
            content: config.content,
            photos: config.photos,
            reference,
            carousel: config.carousel_photos,
        })
    }
}

/// Everything a run needs, captured once at admission and never mutated
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub id: Uuid,
    pub name: String,
    pub urls: Vec<String>,
    pub selectors: Arc<BatchSelectors>,
    pub started_at: DateTime<Utc>,
}

impl BatchContext {
    /// Validate a submission
    ///
    /// Rejects an empty URL list, a selector config with neither content nor
    /// photo selectors, and a reference pattern that does not compile.
    pub fn from_request(request: ScrapeRequest) -> Result<Self, SubmitError> {
        if request.urls.is_empty() {
            return Err(SubmitError::EmptyUrls);
        }
        let selectors = BatchSelectors::try_from(request.selectors)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: request.name,
            urls: request.urls,
            selectors: Arc::new(selectors),
            started_at: Utc::now(),
        })
    }

    /// One task per URL, in submission order
    pub fn tasks(&self) -> Vec<ExtractionTask> {
        ExtractionTask::for_urls(self.urls.iter().cloned(), &self.selectors)
    }

    /// Log prefix: the batch name, or the batch id when unnamed
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// One URL to render, with the batch's selectors
#[derive(Debug, Clone)]
pub struct ExtractionTask {
    pub url: String,
    pub selectors: Arc<BatchSelectors>,
}

impl ExtractionTask {
    pub fn for_urls(
        urls: impl IntoIterator<Item = String>,
        selectors: &Arc<BatchSelectors>,
    ) -> Vec<Self> {
        urls.into_iter()
            .map(|url| Self {
                url,
                selectors: Arc::clone(selectors),
            })
            .collect()
    }
}

/// Outcome of one extraction task
///
/// `error` set means navigation failed and content/photos are empty;
/// otherwise the result is eligible for persistence even if nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    pub reference: String,
    pub content: String,
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn new(url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reference: reference.into(),
            ..Self::default()
        }
    }

    pub fn failed(url: impl Into<String>, reference: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(url, reference)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Final report of a completed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub name: String,
    /// Primary-pass results received
    pub processed: usize,
    pub saved: usize,
    pub errors: usize,
    /// Retry-pass results received
    pub retried: usize,
    pub final_failures: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
