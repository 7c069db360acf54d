use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::AppState;
use crate::batch::{BatchSummary, ScrapeRequest, SubmitError};

const HEALTH_DB_TIMEOUT: Duration = Duration::from_secs(5);

impl SubmitError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubmitError::EmptyUrls
            | SubmitError::NoSelectors
            | SubmitError::InvalidPattern { .. } => StatusCode::BAD_REQUEST,
            SubmitError::Busy => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Accept a batch; scraping continues after the response is sent
pub async fn scrape_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!("Rejected scrape body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    match state.service.submit(request).await {
        Ok(handle) => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "accepted", "batch_id": handle.batch_id() })),
        )
            .into_response(),
        Err(e) => {
            warn!("Scrape submission rejected: {}", e);
            e.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    ok: String,
    database: String,
    running: bool,
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match tokio::time::timeout(HEALTH_DB_TIMEOUT, state.service.store().ping()).await {
        Ok(Ok(())) => "ok".to_string(),
        Ok(Err(e)) => format!("error: {e}"),
        Err(_) => "error: query timeout".to_string(),
    };
    let healthy = database == "ok";

    (
        if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
        Json(HealthResponse {
            ok: healthy.to_string(),
            database,
            running: state.service.gate().is_running(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    running: bool,
    last_batch: Option<BatchSummary>,
}

pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: state.service.gate().is_running(),
        last_batch: state.service.last_batch(),
    })
}

/// Same as `/status`, but waits for a running batch to finish first
pub async fn status_wait_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    state.service.gate().wait_idle().await;
    status_handler(State(state)).await
}
