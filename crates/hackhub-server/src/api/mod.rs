// ABOUTME: API module containing all HTTP handler functions for the hackhub REST API.
// ABOUTME: Split into event listing and on-demand ingestion (scrape, sweep).

pub mod events;
pub mod ingest;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::jobs::JobError;

/// Map a failed job to a 500 with a JSON error body.
pub(crate) fn job_error_response(context: &str, err: JobError) -> Response {
    tracing::error!("{}: {}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": format!("{}: {}", context, err) })),
    )
        .into_response()
}
