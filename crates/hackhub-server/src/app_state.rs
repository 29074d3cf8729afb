// ABOUTME: Shared application state for the hackhub HTTP server and scheduler.
// ABOUTME: Holds the single store handle behind a mutex and the configured source aggregator.

use std::sync::{Arc, Mutex};

use hackhub_sources::{RegistryError, SourceAggregator, SourceRegistry};
use hackhub_store::{EventStore, RetryPolicy, StoreError};
use thiserror::Error;

use crate::config::HackhubConfig;

/// Errors that can occur while assembling state from configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("source registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared state accessible by all Axum handlers and scheduled jobs.
///
/// The store mutex is the single-writer gate: reconcile and sweep passes
/// never overlap on this handle.
pub struct AppState {
    pub store: Arc<Mutex<EventStore>>,
    pub aggregator: Arc<SourceAggregator>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: EventStore, aggregator: SourceAggregator) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            aggregator: Arc::new(aggregator),
        }
    }

    /// Open the store and build the source list described by `config`.
    pub fn from_config(config: &HackhubConfig) -> Result<Self, StartupError> {
        let retry = RetryPolicy {
            max_attempts: config.commit_attempts,
            ..RetryPolicy::default()
        };
        let store = EventStore::open(&config.db_path)?.with_retry_policy(retry);

        let registry = match &config.sources_path {
            Some(path) => SourceRegistry::load(path)?,
            None => {
                tracing::warn!("HACKHUB_SOURCES not set; scrapes will fetch nothing");
                SourceRegistry::default()
            }
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!("hackhub/", env!("CARGO_PKG_VERSION")))
            .timeout(config.source_timeout)
            .build()?;

        let aggregator = SourceAggregator::new(registry.build_sources(&client))
            .with_timeout(config.source_timeout);
        tracing::info!("{} sources configured", aggregator.len());

        Ok(Self::new(store, aggregator))
    }
}
