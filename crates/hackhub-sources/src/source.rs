// ABOUTME: Defines the RecordSource trait every producer implements, and SourceError.
// ABOUTME: A producer is opaque to the core: it yields raw records or a reason it could not.

use std::time::Duration;

use async_trait::async_trait;
use hackhub_core::RawRecord;

/// Reasons a single producer failed to deliver records.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("source panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// A producer of raw event records, such as a platform feed.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Name used in logs and outcome reports.
    fn name(&self) -> &str;

    /// Platform tag stamped onto records that arrive without one.
    fn platform(&self) -> Option<&str> {
        None
    }

    /// Fetch the current batch of records.
    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError>;
}
