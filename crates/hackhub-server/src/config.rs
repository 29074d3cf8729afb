// ABOUTME: Configuration loading and validation for the hackhub server and CLI.
// ABOUTME: Reads HACKHUB_* environment variables and applies defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HACKHUB_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct HackhubConfig {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub sources_path: Option<PathBuf>,
    pub source_timeout: Duration,
    pub scrape_interval: Duration,
    pub sweep_interval: Duration,
    pub scheduler_enabled: bool,
    pub commit_attempts: u32,
}

impl HackhubConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - HACKHUB_DB: SQLite database file (default: ~/.hackhub/events.db)
    /// - HACKHUB_BIND: socket address to bind (default: 127.0.0.1:8000)
    /// - HACKHUB_SOURCES: YAML source registry (optional; no sources when unset)
    /// - HACKHUB_SOURCE_TIMEOUT_SECS: per-source fetch bound (default: 120)
    /// - HACKHUB_SCRAPE_INTERVAL_SECS: scheduled scrape period (default: 86400)
    /// - HACKHUB_SWEEP_INTERVAL_SECS: scheduled expiry sweep period (default: 43200)
    /// - HACKHUB_SCHEDULER: run the interval jobs when serving (default: true)
    /// - HACKHUB_COMMIT_ATTEMPTS: attempts per store pass on transient failure (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var("HACKHUB_DB")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".hackhub")
                    .join("events.db")
            });

        let bind_str =
            std::env::var("HACKHUB_BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let sources_path = std::env::var("HACKHUB_SOURCES")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let source_timeout = Duration::from_secs(positive("HACKHUB_SOURCE_TIMEOUT_SECS", 120)?);
        let scrape_interval = Duration::from_secs(positive("HACKHUB_SCRAPE_INTERVAL_SECS", 86_400)?);
        let sweep_interval = Duration::from_secs(positive("HACKHUB_SWEEP_INTERVAL_SECS", 43_200)?);

        let scheduler_enabled = std::env::var("HACKHUB_SCHEDULER")
            .map(|v| !matches!(v.as_str(), "false" | "0" | "no" | "off"))
            .unwrap_or(true);

        let commit_attempts = positive("HACKHUB_COMMIT_ATTEMPTS", 3)? as u32;

        Ok(Self {
            db_path,
            bind,
            sources_path,
            source_timeout,
            scrape_interval,
            sweep_interval,
            scheduler_enabled,
            commit_attempts,
        })
    }
}

fn positive(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 && n <= u64::from(u32::MAX) => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value }),
        },
        Err(_) => Ok(default),
    }
}
