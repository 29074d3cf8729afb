// ABOUTME: JsonFeedSource fetches a JSON list of raw event records over HTTP.
// ABOUTME: Accepts a bare array or an object wrapping one; malformed entries are dropped with a warning.

use async_trait::async_trait;
use hackhub_core::RawRecord;
use serde_json::Value;

use crate::source::{RecordSource, SourceError};

/// Keys under which a wrapped feed may carry its record list.
const WRAPPER_KEYS: [&str; 3] = ["events", "hackathons", "records"];

/// A producer backed by an HTTP endpoint returning JSON records.
#[derive(Debug, Clone)]
pub struct JsonFeedSource {
    name: String,
    platform: Option<String>,
    url: String,
    client: reqwest::Client,
}

impl JsonFeedSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_owned(),
            platform: None,
            url: url.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }

    /// Share one HTTP client (and its connection pool) across feeds.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl RecordSource for JsonFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let resp = self.client.get(&self.url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body: Value = resp.json().await?;
        decode_records(&self.name, &body)
    }
}

/// Coerce a feed payload into raw records.
pub fn decode_records(source: &str, body: &Value) -> Result<Vec<RawRecord>, SourceError> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| {
                SourceError::Decode(format!(
                    "object payload has none of the keys {}",
                    WRAPPER_KEYS.join(", ")
                ))
            })?,
        _ => return Err(SourceError::Decode("expected a JSON array".to_string())),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match RawRecord::from_value(entry) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("{}: dropping entry {}: {}", source, index, e),
        }
    }

    Ok(records)
}
