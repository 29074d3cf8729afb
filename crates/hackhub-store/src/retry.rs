// ABOUTME: Bounded retry of whole store passes across transient SQLite failures.
// ABOUTME: Each retry runs on a fresh connection; integrity failures are never retried.

use std::time::Duration;

use rusqlite::{Connection, ErrorCode};

use crate::sqlite::{EventStore, StoreError};

/// How many times a pass may be attempted, and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A policy with the given attempt bound and no pause between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// How a failed attempt should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connectivity or contention; retry on a fresh connection.
    Transient,
    /// Constraint violation; the batch itself is bad.
    Integrity,
    /// Anything else; surfaced as-is.
    Fatal,
}

/// Classify a SQLite error for the retry loop.
pub fn classify(err: &rusqlite::Error) -> FailureKind {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => FailureKind::Integrity,
        Some(
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure,
        ) => FailureKind::Transient,
        _ => FailureKind::Fatal,
    }
}

/// Run `pass` against the store's connection under the store's retry policy.
///
/// `pass` owns its transaction: it must either commit or leave nothing behind.
/// A transient failure triggers a reconnect and a rerun of the whole pass.
pub(crate) fn run_with_retry<T>(
    store: &mut EventStore,
    label: &str,
    mut pass: impl FnMut(&mut Connection) -> Result<T, rusqlite::Error>,
) -> Result<T, StoreError> {
    let policy = store.retry_policy();
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            if !policy.delay.is_zero() {
                std::thread::sleep(policy.delay);
            }
            if let Err(e) = store.reconnect() {
                tracing::warn!("{} attempt {}/{}: reconnect failed: {}", label, attempt, attempts, e);
                last_error = Some(e);
                continue;
            }
        }

        let err = match pass(&mut store.conn) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        match classify(&err) {
            FailureKind::Integrity => {
                tracing::error!("{} failed on integrity violation: {}", label, err);
                return Err(StoreError::Integrity(err));
            }
            FailureKind::Fatal => {
                tracing::error!("{} failed: {}", label, err);
                return Err(StoreError::Sqlite(err));
            }
            FailureKind::Transient => {
                tracing::warn!("{} attempt {}/{} failed: {}", label, attempt, attempts, err);
                last_error = Some(err);
            }
        }
    }

    let last = last_error.unwrap_or(rusqlite::Error::InvalidQuery);
    tracing::error!("{} gave up after {} attempts", label, attempts);
    Err(StoreError::RetriesExhausted { attempts, last })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;
    use tempfile::TempDir;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    fn store(dir: &TempDir, attempts: u32) -> EventStore {
        EventStore::open(&dir.path().join("events.db"))
            .unwrap()
            .with_retry_policy(RetryPolicy::immediate(attempts))
    }

    #[test]
    fn classify_maps_sqlite_codes() {
        assert_eq!(classify(&failure(ffi::SQLITE_BUSY)), FailureKind::Transient);
        assert_eq!(classify(&failure(ffi::SQLITE_LOCKED)), FailureKind::Transient);
        assert_eq!(classify(&failure(ffi::SQLITE_CANTOPEN)), FailureKind::Transient);
        assert_eq!(classify(&failure(ffi::SQLITE_IOERR)), FailureKind::Transient);
        assert_eq!(
            classify(&failure(ffi::SQLITE_CONSTRAINT)),
            FailureKind::Integrity
        );
        assert_eq!(classify(&failure(ffi::SQLITE_CORRUPT)), FailureKind::Fatal);
        assert_eq!(classify(&rusqlite::Error::InvalidQuery), FailureKind::Fatal);
    }

    #[test]
    fn transient_failure_is_retried_until_success() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, 3);
        let mut calls = 0;

        let result = run_with_retry(&mut store, "test", |_conn| {
            calls += 1;
            if calls < 3 {
                Err(failure(ffi::SQLITE_BUSY))
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn exhausted_retries_surface_last_error() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, 3);
        let mut calls = 0;

        let result: Result<(), _> = run_with_retry(&mut store, "test", |_conn| {
            calls += 1;
            Err(failure(ffi::SQLITE_LOCKED))
        });

        assert_eq!(calls, 3);
        match result {
            Err(StoreError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last.sqlite_error_code(), Some(ErrorCode::DatabaseLocked));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[test]
    fn integrity_failure_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, 3);
        let mut calls = 0;

        let result: Result<(), _> = run_with_retry(&mut store, "test", |_conn| {
            calls += 1;
            Err(failure(ffi::SQLITE_CONSTRAINT))
        });

        assert_eq!(calls, 1);
        assert!(matches!(result, Err(StoreError::Integrity(_))));
    }

    #[test]
    fn fatal_failure_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, 3);
        let mut calls = 0;

        let result: Result<(), _> = run_with_retry(&mut store, "test", |_conn| {
            calls += 1;
            Err(rusqlite::Error::InvalidQuery)
        });

        assert_eq!(calls, 1);
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
    }

    #[test]
    fn zero_attempt_policy_still_runs_once() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, 0);

        let result = run_with_retry(&mut store, "test", |_conn| Ok(7));

        assert_eq!(result.unwrap(), 7);
    }
}
