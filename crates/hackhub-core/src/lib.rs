// ABOUTME: Core library for hackhub: event record types, identity resolution, and input dedup.
// ABOUTME: Everything here is pure; storage and producers live in sibling crates.

pub mod dedup;
pub mod identity;
pub mod record;
pub mod summary;

pub use dedup::{Keyed, dedupe};
pub use identity::resolve_identity;
pub use record::{EventRecord, MutableField, RawRecord, RecordError, parse_date};
pub use summary::ReconcileSummary;
