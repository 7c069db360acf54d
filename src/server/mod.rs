//! HTTP surface
//!
//! - `POST /scrape` submits a batch (202 accepted, 400 invalid, 409 busy)
//! - `GET /health` reports database connectivity and gate state
//! - `GET /status` reports the gate state and last batch without blocking
//! - `GET /status/wait` blocks behind a running batch, then reports

pub mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::batch::ScrapeService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScrapeService>,
}

pub fn router(service: Arc<ScrapeService>) -> Router {
    Router::new()
        .route("/scrape", post(routes::scrape_handler))
        .route("/health", get(routes::health_handler))
        .route("/status", get(routes::status_handler))
        .route("/status/wait", get(routes::status_wait_handler))
        .with_state(AppState { service })
}
