// ABOUTME: Read-only event listing handler with an optional platform filter.
// ABOUTME: Empty platform values are treated the same as no filter.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::api::job_error_response;
use crate::app_state::SharedState;
use crate::jobs;

/// Query string for the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub platform: Option<String>,
}

/// GET /api/events - List stored events, optionally for one platform.
pub async fn list_events(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let platform = query.platform.filter(|p| !p.is_empty());

    match jobs::list_events(&state, platform).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => job_error_response("failed to list events", e),
    }
}
