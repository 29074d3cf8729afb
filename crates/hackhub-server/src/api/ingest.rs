// ABOUTME: On-demand ingestion handlers: scrape-and-reconcile now, and expiry sweep now.
// ABOUTME: Both call the same job functions the scheduler uses.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::api::job_error_response;
use crate::app_state::SharedState;
use crate::jobs;

/// POST /api/scrape-now - Fetch every source and reconcile the result.
pub async fn scrape_now(State(state): State<SharedState>) -> Response {
    match jobs::run_scrape(&state).await {
        Ok(report) => Json(serde_json::json!({
            "status": "done",
            "run_id": report.run_id,
            "summary": report.summary,
            "sources": report.sources,
        }))
        .into_response(),
        Err(e) => job_error_response("scrape failed", e),
    }
}

/// POST /api/sweep - Delete events whose end date has passed.
pub async fn sweep_now(State(state): State<SharedState>) -> Response {
    match jobs::run_sweep(&state).await {
        Ok(deleted) => Json(serde_json::json!({
            "status": "done",
            "deleted": deleted,
        }))
        .into_response(),
        Err(e) => job_error_response("sweep failed", e),
    }
}
