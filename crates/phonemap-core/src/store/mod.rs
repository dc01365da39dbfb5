//! MappingStore: SQLite-backed real <-> fake phone mappings.
//!
//! Provides:
//! - indexed point lookups in both directions
//! - all-or-nothing batch insert
//! - transactional full-table replace (readers see the old or the new set, never a mix)
//! - append-only call log
//!
//! Every operation reports an unreachable database as [`StoreError::Connection`];
//! callers log and treat it as a failed operation.

mod rows;
mod schema;
mod txn;

pub use rows::{CallLogEntry, PhoneMapping};
pub use schema::MAPPING_SCHEMA;

use crate::errors::StoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Default wait for a competing writer before failing with `Connection`.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed mapping store. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct MappingStore {
    conn: Arc<Mutex<Connection>>,
}

impl MappingStore {
    /// Open a file-backed store, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open with a custom busy timeout. Reads never wait on a writer in WAL
    /// mode; the timeout bounds how long a write (e.g. a call log append)
    /// waits while another connection holds the write lock.
    pub fn open_with_busy_timeout(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn, busy_timeout)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_connection(&conn, DEFAULT_BUSY_TIMEOUT)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection, busy_timeout: Duration) -> Result<(), StoreError> {
        conn.busy_timeout(busy_timeout)?;
        // WAL mode for file-backed DBs (reports "memory" for in-memory)
        let _ = conn.query_row("PRAGMA journal_mode = WAL", [], |row| {
            row.get::<_, String>(0)
        });
        conn.execute_batch(MAPPING_SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        match self.conn.lock() {
            Ok(guard) => Ok(guard),
            Err(poisoned) => {
                // a panic mid-operation may have left a transaction open
                let guard = poisoned.into_inner();
                if !guard.is_autocommit() {
                    guard.execute_batch("ROLLBACK")?;
                }
                self.conn.clear_poison();
                tracing::warn!("connection recovered after a panic");
                Ok(guard)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Real number mapped to `fake`, if any.
    pub fn lookup_real_by_fake(&self, fake: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let real = conn
            .query_row(
                "SELECT real_phone FROM phone_mappings WHERE fake_phone = ?1",
                [fake],
                |row| row.get(0),
            )
            .optional()?;
        Ok(real)
    }

    /// Fake number mapped to `real`, if any.
    pub fn lookup_fake_by_real(&self, real: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let fake = conn
            .query_row(
                "SELECT fake_phone FROM phone_mappings WHERE real_phone = ?1",
                [real],
                |row| row.get(0),
            )
            .optional()?;
        Ok(fake)
    }

    /// Insert all pairs as one unit. Any collision with an existing row (or within
    /// `pairs`) fails with [`StoreError::ConstraintViolation`] and inserts nothing.
    pub fn insert_batch(&self, pairs: &[(String, String)]) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        txn::in_immediate_txn(&conn, |conn| insert_pairs(conn, pairs, Utc::now()))
    }

    /// Replace the whole table with `pairs` in one transaction.
    ///
    /// On success the table holds exactly `pairs`; on failure it is left as it
    /// was before the call. Returns the inserted count.
    pub fn replace_all(&self, pairs: &[(String, String)]) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        txn::in_immediate_txn(&conn, |conn| {
            conn.execute("DELETE FROM phone_mappings", [])?;
            if pairs.is_empty() {
                return Ok(0);
            }
            insert_pairs(conn, pairs, Utc::now())
        })
    }

    /// All mappings, newest first.
    pub fn list_all(&self) -> Result<Vec<PhoneMapping>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT real_phone, fake_phone, created_at
             FROM phone_mappings
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PhoneMapping {
                    real_phone: row.get(0)?,
                    fake_phone: row.get(1)?,
                    created_at: parse_timestamp(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Real and fake numbers currently stored, for uniqueness checks.
    pub fn known_sets(&self) -> Result<(HashSet<String>, HashSet<String>), StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT real_phone, fake_phone FROM phone_mappings")?;
        let mut reals = HashSet::new();
        let mut fakes = HashSet::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for r in rows {
            let (real, fake) = r?;
            reals.insert(real);
            fakes.insert(fake);
        }
        Ok((reals, fakes))
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM phone_mappings", [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    }

    /// Delete every mapping. Returns the number of rows removed.
    pub fn clear_all(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM phone_mappings", [])?;
        Ok(deleted)
    }

    /// Append an audit record for a resolved call.
    pub fn append_call_log(&self, fake: &str, real: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO call_logs (fake_phone, real_phone, call_timestamp) VALUES (?1, ?2, ?3)",
            params![fake, real, format_timestamp(Utc::now())],
        )?;
        Ok(())
    }

    /// Call log entries for one fake number, oldest first.
    pub fn call_log_for(&self, fake: &str) -> Result<Vec<CallLogEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT fake_phone, real_phone, call_timestamp
             FROM call_logs
             WHERE fake_phone = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([fake], |row| {
                Ok(CallLogEntry {
                    fake_phone: row.get(0)?,
                    real_phone: row.get(1)?,
                    call_timestamp: parse_timestamp(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn insert_pairs(
    conn: &Connection,
    pairs: &[(String, String)],
    created_at: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let created_at = format_timestamp(created_at);
    let mut stmt = conn.prepare_cached(
        "INSERT INTO phone_mappings (real_phone, fake_phone, created_at) VALUES (?1, ?2, ?3)",
    )?;
    for (real, fake) in pairs {
        stmt.execute(params![real, fake, created_at])?;
    }
    Ok(pairs.len())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
