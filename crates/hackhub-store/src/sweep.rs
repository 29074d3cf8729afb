// ABOUTME: Expiration sweep that bulk-deletes events whose end date has passed.
// ABOUTME: Runs as one set-based DELETE under the same transaction and retry rules as reconcile.

use chrono::{Local, NaiveDate};
use rusqlite::{Connection, TransactionBehavior, params};

use crate::retry::run_with_retry;
use crate::sqlite::{EventStore, StoreError};

/// Delete every record with an `end_date` strictly before `today`.
/// Records without an end date are never touched. Returns the number deleted.
pub fn sweep_expired(store: &mut EventStore, today: NaiveDate) -> Result<usize, StoreError> {
    let deleted = run_with_retry(store, "sweep", |conn| sweep_pass(conn, today))?;

    if deleted > 0 {
        tracing::info!("deleted {} expired events (end_date < {})", deleted, today);
    } else {
        tracing::info!("no expired events to delete");
    }

    Ok(deleted)
}

/// Sweep against the local calendar date, read once before the pass starts.
pub fn sweep_expired_now(store: &mut EventStore) -> Result<usize, StoreError> {
    let today = Local::now().date_naive();
    sweep_expired(store, today)
}

fn sweep_pass(conn: &mut Connection, today: NaiveDate) -> Result<usize, rusqlite::Error> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let deleted = match tx.execute(
        "DELETE FROM events WHERE end_date IS NOT NULL AND end_date < ?1",
        params![today],
    ) {
        Ok(n) => n,
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::warn!("rollback after failed sweep also failed: {}", rollback_err);
            }
            return Err(e);
        }
    };

    tx.commit()?;
    Ok(deleted)
}
