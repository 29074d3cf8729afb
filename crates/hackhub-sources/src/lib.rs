// ABOUTME: Record producers for hackhub and the aggregator that isolates their failures.
// ABOUTME: Defines the RecordSource trait, a JSON feed producer, and the YAML source registry.

pub mod aggregator;
pub mod feed;
pub mod registry;
pub mod source;
pub mod testing;

pub use aggregator::{AggregateReport, DEFAULT_SOURCE_TIMEOUT, SourceAggregator, SourceOutcome};
pub use feed::{JsonFeedSource, decode_records};
pub use registry::{RegistryError, SourceConfig, SourceRegistry};
pub use source::{RecordSource, SourceError};
