// ABOUTME: Scrape and sweep jobs shared by the HTTP handlers, the scheduler, and the CLI.
// ABOUTME: Store passes run on the blocking pool while holding the store mutex.

use std::sync::{Arc, Mutex};

use hackhub_core::{EventRecord, ReconcileSummary};
use hackhub_sources::SourceOutcome;
use hackhub_store::{EventStore, StoreError, reconcile, sweep_expired_now};
use serde::Serialize;
use thiserror::Error;
use ulid::Ulid;

use crate::app_state::AppState;

/// Errors that can occur while running a job against the store.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("store lock poisoned by an earlier panic")]
    Poisoned,

    #[error("blocking task failed: {0}")]
    Join(String),
}

/// Result of one scrape: per-source outcomes and the reconcile summary.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub run_id: String,
    pub summary: ReconcileSummary,
    pub sources: Vec<SourceOutcome>,
}

/// Aggregate all sources, then reconcile the combined batch into the store.
pub async fn run_scrape(state: &AppState) -> Result<ScrapeReport, JobError> {
    let run_id = Ulid::new().to_string();
    tracing::info!(run_id = %run_id, "scrape started");

    let report = state.aggregator.aggregate().await;
    let records = report.records;

    let summary = with_store(&state.store, move |store| reconcile(store, records)).await?;

    tracing::info!(run_id = %run_id, "scrape done: {} new events", summary.inserted);

    Ok(ScrapeReport {
        run_id,
        summary,
        sources: report.outcomes,
    })
}

/// Delete expired events as of today.
pub async fn run_sweep(state: &AppState) -> Result<usize, JobError> {
    let deleted = with_store(&state.store, sweep_expired_now).await?;
    tracing::info!("cleanup complete: {} expired events deleted", deleted);
    Ok(deleted)
}

/// List stored events, optionally for one platform.
pub async fn list_events(
    state: &AppState,
    platform: Option<String>,
) -> Result<Vec<EventRecord>, JobError> {
    with_store(&state.store, move |store| store.list_events(platform.as_deref())).await
}

async fn with_store<T, F>(store: &Arc<Mutex<EventStore>>, op: F) -> Result<T, JobError>
where
    T: Send + 'static,
    F: FnOnce(&mut EventStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);

    tokio::task::spawn_blocking(move || {
        let mut guard = store.lock().map_err(|_| JobError::Poisoned)?;
        op(&mut *guard).map_err(JobError::from)
    })
    .await
    .map_err(|e| JobError::Join(e.to_string()))?
}
