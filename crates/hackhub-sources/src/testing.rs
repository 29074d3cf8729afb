// ABOUTME: Test utilities for hackhub-sources: canned, failing, hanging, and panicking producers.
// ABOUTME: Used in tests to drive the aggregator without network access.

use std::time::Duration;

use async_trait::async_trait;
use hackhub_core::RawRecord;

use crate::source::{RecordSource, SourceError};

/// A source that always returns the same records.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    platform: Option<String>,
    records: Vec<RawRecord>,
}

impl StaticSource {
    pub fn new(name: &str, records: Vec<RawRecord>) -> Self {
        Self {
            name: name.to_owned(),
            platform: None,
            records,
        }
    }

    /// Stamp `platform` onto records that lack one.
    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_owned());
        self
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

/// A source that always fails with the given reason.
#[derive(Debug, Clone)]
pub struct FailingSource {
    name: String,
    reason: String,
}

impl FailingSource {
    pub fn new(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

#[async_trait]
impl RecordSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        Err(SourceError::Other(self.reason.clone()))
    }
}

/// A source that sleeps far longer than any sensible timeout.
#[derive(Debug, Clone)]
pub struct HangingSource {
    name: String,
}

impl HangingSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

#[async_trait]
impl RecordSource for HangingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// A source whose fetch panics.
#[derive(Debug, Clone)]
pub struct PanickingSource {
    name: String,
}

impl PanickingSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

#[async_trait]
impl RecordSource for PanickingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        panic!("parser state corrupted in {}", self.name);
    }
}
