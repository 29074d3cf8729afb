// ABOUTME: HTTP server for hackhub, exposing event listing and on-demand ingestion.
// ABOUTME: Also hosts configuration loading, the shared job runners, and the interval scheduler.

pub mod api;
pub mod app_state;
pub mod config;
pub mod jobs;
pub mod routes;
pub mod scheduler;

pub use app_state::{AppState, SharedState, StartupError};
pub use config::{ConfigError, HackhubConfig};
pub use jobs::{JobError, ScrapeReport, list_events, run_scrape, run_sweep};
pub use routes::create_router;
pub use scheduler::Scheduler;
