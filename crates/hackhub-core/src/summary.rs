// ABOUTME: Counters reported by one reconciliation pass.

use serde::{Deserialize, Serialize};

/// Outcome counts of a reconciliation pass.
///
/// `total` is the size of the deduplicated batch. A matched record always
/// counts toward `skipped` and additionally toward `updated` when any field
/// changed, so `updated + skipped` may exceed the number of matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub total: usize,
}
