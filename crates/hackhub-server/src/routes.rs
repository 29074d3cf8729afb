// ABOUTME: Route definitions for the hackhub HTTP API.
// ABOUTME: Assembles all API routes into a single Axum Router with CORS, tracing, and shared state.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/events", get(api::events::list_events))
        .route("/api/scrape-now", post(api::ingest::scrape_now))
        .route("/api/sweep", post(api::ingest::sweep_now))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
