// HTTP server: accepts listing batches on POST /scrape and refreshes them
// through a pool of headless Chromium sessions.

use anyhow::{Context, Result};
use listing_scraper::{ChromiumDriver, PgListingStore, ScrapeService, ScraperConfig, server};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_scraper=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ScraperConfig::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let database_url = config
        .database_url()
        .context("Database URL missing from configuration")?;
    let store = PgListingStore::connect(database_url, config.db_max_connections())
        .await
        .context("Failed to connect to database")?;

    let driver = Arc::new(
        ChromiumDriver::launch(&config)
            .await
            .context("Failed to launch browser")?,
    );

    let addr = format!("0.0.0.0:{}", config.port());
    let service = ScrapeService::new(driver.clone(), Arc::new(store), config);
    let app = server::router(service);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped, closing browser");
    match Arc::try_unwrap(driver) {
        Ok(driver) => driver.shutdown().await,
        Err(_) => tracing::warn!("A batch is still running; browser will be killed on exit"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
