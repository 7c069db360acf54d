//! Environment loader
//!
//! Reads an optional `.env` first, then process environment variables.

use std::env;
use std::str::FromStr;

use super::types::{ConfigError, ScraperConfig};

fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(var: &'static str) -> Result<Option<bool>, ConfigError> {
    match env::var(var) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnv { var, value }),
        },
        Err(_) => Ok(None),
    }
}

/// `DATABASE_URL`, or a URL assembled from the individual `DB_*` variables
fn database_url_from_env() -> Result<String, ConfigError> {
    if let Ok(url) = env::var("DATABASE_URL")
        && !url.trim().is_empty()
    {
        return Ok(url);
    }

    let part = |var: &'static str| env::var(var).map_err(|_| ConfigError::MissingDatabase(var));

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        part("DB_USER")?,
        part("DB_PASSWORD")?,
        part("DB_HOST")?,
        part("DB_PORT")?,
        part("DB_DATABASE")?
    ))
}

impl ScraperConfig {
    /// Build the configuration from the environment
    ///
    /// Database settings are required; everything else falls back to the
    /// builder defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = ScraperConfig::builder().database_url(database_url_from_env()?);

        if let Some(port) = parse_var::<u16>("PORT")? {
            builder = builder.port(port);
        }
        if let Some(n) = parse_var::<u32>("DB_MAX_CONNECTIONS")? {
            builder = builder.db_max_connections(n);
        }
        if let Some(headless) = parse_bool("HEADLESS")? {
            builder = builder.headless(headless);
        }
        if let Ok(path) = env::var("CHROMIUM_PATH")
            && !path.trim().is_empty()
        {
            builder = builder.chromium_path(path);
        }

        builder.build()
    }
}
