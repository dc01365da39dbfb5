use crate::errors::StoreError;
use rusqlite::Connection;

/// Run `body` inside `BEGIN IMMEDIATE`; commit on success, roll back on any error
/// (including a failed `COMMIT`).
pub(crate) fn in_immediate_txn<T>(
    conn: &Connection,
    body: impl FnOnce(&Connection) -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    // BEGIN IMMEDIATE takes the write lock up front
    conn.execute("BEGIN IMMEDIATE", [])?;

    let result = body(conn).and_then(|value| {
        conn.execute("COMMIT", [])?;
        Ok(value)
    });

    if result.is_err() && !conn.is_autocommit() {
        let _ = conn.execute("ROLLBACK", []);
    }

    result
}
