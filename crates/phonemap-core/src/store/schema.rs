//! SQLite schema for the mapping store.
//!
//! Tables:
//! - `phone_mappings`: real <-> fake pairs, each side globally unique
//! - `call_logs`: append-only audit of successful reverse lookups

/// DDL for the mapping store. Idempotent.
pub const MAPPING_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS phone_mappings (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    real_phone  TEXT NOT NULL UNIQUE,
    fake_phone  TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS call_logs (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    fake_phone      TEXT NOT NULL,
    real_phone      TEXT NOT NULL,
    call_timestamp  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_call_logs_fake_phone
    ON call_logs(fake_phone);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_valid_sql() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MAPPING_SCHEMA).unwrap();
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MAPPING_SCHEMA).unwrap();
        conn.execute_batch(MAPPING_SCHEMA).unwrap();
    }
}
