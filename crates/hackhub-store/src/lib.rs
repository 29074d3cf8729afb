// ABOUTME: Persistence layer for hackhub: the canonical SQLite event store.
// ABOUTME: Provides reconciliation passes, expiration sweeps, and bounded retry on transient failures.

pub mod reconcile;
pub mod retry;
pub mod sqlite;
pub mod sweep;

pub use reconcile::reconcile;
pub use retry::{FailureKind, RetryPolicy, classify};
pub use sqlite::{EventStore, StoreError};
pub use sweep::{sweep_expired, sweep_expired_now};
