// ABOUTME: Reconciliation pass: deduplicate a raw batch, then insert-or-merge it against the store.
// ABOUTME: The whole pass runs in one IMMEDIATE transaction and commits or rolls back as a unit.

use hackhub_core::{EventRecord, Keyed, RawRecord, ReconcileSummary, dedupe};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::retry::run_with_retry;
use crate::sqlite::{EventStore, StoreError, insert_event, load_snapshot, update_mutable};

/// Reconcile a raw batch into the store.
///
/// Re-running with the same batch is a no-op apart from the `skipped` count.
/// Transient failures rerun the whole pass under the store's retry policy;
/// integrity failures roll back the batch and are returned immediately.
pub fn reconcile(
    store: &mut EventStore,
    records: Vec<RawRecord>,
) -> Result<ReconcileSummary, StoreError> {
    let raw_count = records.len();
    let batch = dedupe(records);

    let summary = run_with_retry(store, "reconcile", |conn| reconcile_pass(conn, &batch))?;

    tracing::info!(
        "reconciled {} raw records ({} unique): inserted={} updated={} skipped={}",
        raw_count,
        summary.total,
        summary.inserted,
        summary.updated,
        summary.skipped
    );

    Ok(summary)
}

fn reconcile_pass(
    conn: &mut Connection,
    batch: &[Keyed],
) -> Result<ReconcileSummary, rusqlite::Error> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    match apply_batch(&tx, batch) {
        Ok(summary) => {
            tx.commit()?;
            Ok(summary)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::warn!("rollback after failed reconcile also failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

fn apply_batch(tx: &Transaction<'_>, batch: &[Keyed]) -> Result<ReconcileSummary, rusqlite::Error> {
    let mut snapshot = load_snapshot(tx)?;
    tracing::debug!("rows already in store: {}", snapshot.len());

    let mut summary = ReconcileSummary {
        total: batch.len(),
        ..ReconcileSummary::default()
    };

    for Keyed { identity, record } in batch {
        if let Some(existing) = snapshot.get_mut(identity) {
            let changed = existing.merge_from(record);
            if !changed.is_empty() {
                update_mutable(tx, existing)?;
                summary.updated += 1;
                let fields: Vec<_> = changed.iter().map(|f| f.as_str()).collect();
                tracing::debug!("updated '{}': {}", existing.name, fields.join(", "));
            }
            // Matched records count as skipped even when updated.
            summary.skipped += 1;
            continue;
        }

        let fresh = EventRecord::from_raw(identity.clone(), record);
        insert_event(tx, &fresh)?;
        snapshot.insert(identity.clone(), fresh);
        summary.inserted += 1;
    }

    Ok(summary)
}
