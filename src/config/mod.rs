//! Configuration for the listing scraper
//!
//! `ScraperConfig` carries process-wide settings: HTTP port, database
//! connection, browser launch options and the pool/timeout tuning used by
//! every batch. Per-batch selectors are not configuration; they arrive with
//! each submission.

pub mod builder;
pub mod env;
pub mod getters;
pub mod types;

pub use builder::ScraperConfigBuilder;
pub use types::{ConfigError, ScraperConfig};
