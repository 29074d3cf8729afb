// ABOUTME: SourceAggregator runs each configured producer in order and concatenates what succeeds.
// ABOUTME: A failing, hanging, or panicking producer contributes zero records and never aborts the batch.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use hackhub_core::RawRecord;
use serde::Serialize;

use crate::source::{RecordSource, SourceError};

/// Upper bound on a single producer call when none is configured.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(120);

/// What happened when one producer was invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Fetched { source: String, count: usize },
    Failed { source: String, reason: String },
}

impl SourceOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }
}

/// The concatenated records of every successful source, plus one outcome per source.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub records: Vec<RawRecord>,
    pub outcomes: Vec<SourceOutcome>,
}

impl AggregateReport {
    /// Number of sources that failed.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Invokes producers sequentially, bounding each with a timeout.
pub struct SourceAggregator {
    sources: Vec<Arc<dyn RecordSource>>,
    timeout: Duration,
}

impl SourceAggregator {
    pub fn new(sources: Vec<Arc<dyn RecordSource>>) -> Self {
        Self {
            sources,
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Run every source in order. Never fails; per-source errors are logged
    /// and reported in the outcomes.
    pub async fn aggregate(&self) -> AggregateReport {
        let mut report = AggregateReport::default();

        for source in &self.sources {
            let name = source.name().to_string();
            tracing::info!("fetching events from {}", name);

            match self.fetch_one(source.as_ref()).await {
                Ok(mut records) => {
                    if let Some(platform) = source.platform() {
                        for record in records.iter_mut().filter(|r| r.platform.is_none()) {
                            record.platform = Some(platform.to_string());
                        }
                    }
                    tracing::info!("{}: {} events fetched", name, records.len());
                    report.outcomes.push(SourceOutcome::Fetched {
                        source: name,
                        count: records.len(),
                    });
                    report.records.extend(records);
                }
                Err(e) => {
                    tracing::error!("{} fetch failed: {}", name, e);
                    report.outcomes.push(SourceOutcome::Failed {
                        source: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "total events fetched: {} ({} of {} sources failed)",
            report.records.len(),
            report.failures(),
            self.sources.len()
        );

        report
    }

    async fn fetch_one(&self, source: &dyn RecordSource) -> Result<Vec<RawRecord>, SourceError> {
        let guarded = AssertUnwindSafe(source.fetch()).catch_unwind();

        match tokio::time::timeout(self.timeout, guarded).await {
            Err(_) => Err(SourceError::Timeout(self.timeout)),
            Ok(Err(panic)) => Err(SourceError::Panicked(panic_message(&*panic))),
            Ok(Ok(result)) => result,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSource, HangingSource, PanickingSource, StaticSource};

    fn raw(platform: Option<&str>, name: &str) -> RawRecord {
        RawRecord {
            platform: platform.map(str::to_string),
            name: Some(name.to_string()),
            ..RawRecord::default()
        }
    }

    fn names(report: &AggregateReport) -> Vec<&str> {
        report
            .records
            .iter()
            .map(|r| r.name.as_deref().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn failing_source_does_not_block_the_others() {
        let aggregator = SourceAggregator::new(vec![
            Arc::new(StaticSource::new("devpost", vec![raw(Some("Devpost"), "A")])),
            Arc::new(FailingSource::new("unstop", "403 forbidden")),
            Arc::new(StaticSource::new(
                "mlh",
                vec![raw(Some("MLH"), "B"), raw(Some("MLH"), "C")],
            )),
        ]);

        let report = aggregator.aggregate().await;

        assert_eq!(names(&report), vec!["A", "B", "C"]);
        assert_eq!(report.failures(), 1);
        assert_eq!(
            report.outcomes[1],
            SourceOutcome::Failed {
                source: "unstop".to_string(),
                reason: "403 forbidden".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn records_are_not_deduplicated_here() {
        let same = raw(Some("X"), "dup");
        let aggregator = SourceAggregator::new(vec![
            Arc::new(StaticSource::new("one", vec![same.clone()])),
            Arc::new(StaticSource::new("two", vec![same])),
        ]);

        let report = aggregator.aggregate().await;

        assert_eq!(report.records.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_source_times_out() {
        let aggregator = SourceAggregator::new(vec![
            Arc::new(HangingSource::new("slow")),
            Arc::new(StaticSource::new("fast", vec![raw(Some("X"), "A")])),
        ])
        .with_timeout(Duration::from_secs(5));

        let report = aggregator.aggregate().await;

        assert_eq!(names(&report), vec!["A"]);
        assert!(matches!(
            &report.outcomes[0],
            SourceOutcome::Failed { reason, .. } if reason.contains("timed out")
        ));
    }

    #[tokio::test]
    async fn panicking_source_is_isolated() {
        let aggregator = SourceAggregator::new(vec![
            Arc::new(PanickingSource::new("broken")),
            Arc::new(StaticSource::new("ok", vec![raw(Some("X"), "A")])),
        ]);

        let report = aggregator.aggregate().await;

        assert_eq!(names(&report), vec!["A"]);
        assert!(matches!(
            &report.outcomes[0],
            SourceOutcome::Failed { reason, .. } if reason.contains("parser state corrupted")
        ));
    }

    #[tokio::test]
    async fn source_platform_fills_missing_platform_only() {
        let aggregator = SourceAggregator::new(vec![Arc::new(
            StaticSource::new("devpost", vec![raw(None, "A"), raw(Some("Other"), "B")])
                .with_platform("Devpost"),
        )]);

        let report = aggregator.aggregate().await;

        assert_eq!(report.records[0].platform.as_deref(), Some("Devpost"));
        assert_eq!(report.records[1].platform.as_deref(), Some("Other"));
    }

    #[tokio::test]
    async fn no_sources_yields_empty_report() {
        let report = SourceAggregator::new(Vec::new()).aggregate().await;
        assert!(report.records.is_empty());
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(SourceOutcome::Fetched {
            source: "mlh".to_string(),
            count: 3,
        })
        .unwrap();
        assert_eq!(json["status"], "fetched");
        assert_eq!(json["source"], "mlh");
        assert_eq!(json["count"], 3);
    }
}
