// ABOUTME: SQLite-backed store holding canonical event records keyed by identity.
// ABOUTME: Owns the connection, schema migration, reconnects, and row-level reads and writes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hackhub_core::EventRecord;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::retry::RetryPolicy;

/// How long a connection waits on a competing writer before reporting busy.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COLUMNS: &str =
    "identity, name, platform, link, start_date, end_date, location, prize, participants, image_url";

/// Errors surfaced by store operations. Every variant is reported only after
/// the enclosing transaction has been rolled back.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("integrity violation, batch rolled back: {0}")]
    Integrity(rusqlite::Error),

    #[error("store unavailable after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: rusqlite::Error },
}

/// Handle to the canonical event store. Every pass that mutates the store
/// takes `&mut EventStore`, so one handle serves one writer at a time.
pub struct EventStore {
    path: PathBuf,
    pub(crate) conn: Connection,
    retry: RetryPolicy,
}

impl EventStore {
    /// Open or create the store at `path`, creating parent directories and
    /// running migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = connect(path)?;
        tracing::debug!("opened event store at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            conn,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy applied to reconcile and sweep passes.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the current connection and open a fresh one to the same file.
    pub fn reconnect(&mut self) -> Result<(), rusqlite::Error> {
        self.conn = connect(&self.path)?;
        tracing::info!("reconnected to event store at {}", self.path.display());
        Ok(())
    }

    /// Number of canonical records currently stored.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Look up one record by identity.
    pub fn get(&self, identity: &str) -> Result<Option<EventRecord>, StoreError> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM events WHERE identity = ?1"),
                params![identity],
                event_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// List records, optionally restricted to one platform. Dated records come
    /// first in start-date order, undated ones last; ties break on name.
    pub fn list_events(&self, platform: Option<&str>) -> Result<Vec<EventRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM events
             WHERE (?1 IS NULL OR platform = ?1)
             ORDER BY start_date IS NULL, start_date ASC, name ASC"
        ))?;

        let rows = stmt.query_map(params![platform], event_from_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

/// Open a connection and make sure the schema exists.
fn connect(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS events (
            identity TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            platform TEXT NOT NULL,
            link TEXT,
            start_date TEXT,
            end_date TEXT,
            location TEXT,
            prize TEXT,
            participants TEXT,
            image_url TEXT
        );

        CREATE INDEX IF NOT EXISTS events_end_date ON events(end_date);
        CREATE INDEX IF NOT EXISTS events_platform ON events(platform);",
    )?;

    Ok(conn)
}

fn event_from_row(row: &Row<'_>) -> Result<EventRecord, rusqlite::Error> {
    Ok(EventRecord {
        identity: row.get(0)?,
        name: row.get(1)?,
        platform: row.get(2)?,
        link: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        location: row.get(6)?,
        prize: row.get(7)?,
        participants: row.get(8)?,
        image_url: row.get(9)?,
    })
}

/// Read every stored record, keyed by identity.
pub(crate) fn load_snapshot(
    conn: &Connection,
) -> Result<HashMap<String, EventRecord>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM events"))?;
    let rows = stmt.query_map([], event_from_row)?;

    let mut snapshot = HashMap::new();
    for row in rows {
        let record = row?;
        snapshot.insert(record.identity.clone(), record);
    }
    Ok(snapshot)
}

pub(crate) fn insert_event(conn: &Connection, record: &EventRecord) -> Result<(), rusqlite::Error> {
    conn.execute(
        &format!(
            "INSERT INTO events ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            record.identity,
            record.name,
            record.platform,
            record.link,
            record.start_date,
            record.end_date,
            record.location,
            record.prize,
            record.participants,
            record.image_url,
        ],
    )?;
    Ok(())
}

/// Write back the mutable columns of an already-stored record.
pub(crate) fn update_mutable(conn: &Connection, record: &EventRecord) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE events SET
            prize = ?1,
            participants = ?2,
            location = ?3,
            start_date = ?4,
            end_date = ?5,
            image_url = ?6
         WHERE identity = ?7",
        params![
            record.prize,
            record.participants,
            record.location,
            record.start_date,
            record.end_date,
            record.image_url,
            record.identity,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hackhub_core::RawRecord;
    use tempfile::TempDir;

    fn record(identity: &str, platform: &str, name: &str, start: Option<&str>) -> EventRecord {
        let raw = RawRecord {
            platform: Some(platform.to_string()),
            name: Some(name.to_string()),
            start_date: start.map(str::to_string),
            ..RawRecord::default()
        };
        EventRecord::from_raw(identity.to_string(), &raw)
    }

    #[test]
    fn store_open_creates_parent_dirs_and_schema() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("events.db");

        let store = EventStore::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(store.path(), db_path.as_path());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn store_insert_get_and_update_roundtrip_dates() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::open(&dir.path().join("events.db")).unwrap();

        let mut rec = record("MLH::a", "MLH", "Alpha", Some("2026-03-01"));
        insert_event(&store.conn, &rec).unwrap();

        let loaded = store.get("MLH::a").unwrap().unwrap();
        assert_eq!(loaded.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(loaded.end_date.is_none());

        rec.prize = Some("$500".to_string());
        rec.end_date = NaiveDate::from_ymd_opt(2026, 3, 3);
        update_mutable(&store.conn, &rec).unwrap();

        let loaded = store.get("MLH::a").unwrap().unwrap();
        assert_eq!(loaded, rec);
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn store_list_filters_by_platform_and_orders_by_start() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::open(&dir.path().join("events.db")).unwrap();

        for rec in [
            record("a", "MLH", "Undated", None),
            record("b", "MLH", "Later", Some("2026-05-01")),
            record("c", "Devpost", "Other", Some("2026-01-01")),
            record("d", "MLH", "Sooner", Some("2026-02-01")),
        ] {
            insert_event(&store.conn, &rec).unwrap();
        }

        let mlh: Vec<_> = store
            .list_events(Some("MLH"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(mlh, vec!["Sooner", "Later", "Undated"]);

        assert_eq!(store.list_events(None).unwrap().len(), 4);
        assert!(store.list_events(Some("Unstop")).unwrap().is_empty());
    }

    #[test]
    fn store_reconnect_sees_committed_rows() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::open(&dir.path().join("events.db")).unwrap();
        insert_event(&store.conn, &record("a", "MLH", "Alpha", None)).unwrap();

        store.reconnect().unwrap();

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn snapshot_is_keyed_by_identity() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::open(&dir.path().join("events.db")).unwrap();
        insert_event(&store.conn, &record("x::1", "X", "One", None)).unwrap();
        insert_event(&store.conn, &record("x::2", "X", "Two", None)).unwrap();

        let snapshot = load_snapshot(&store.conn).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["x::2"].name, "Two");
    }
}
