//! Database schema definitions and table creation.
//!
//! One table holds every log. A record is addressed by its scope (the
//! course), its log path, and its key; `id` gives the append order.

use ch_core::error::{ChError, ChResult};
use rusqlite::Connection;
use tracing::info;

/// Create all database tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> ChResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| ChError::Database(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> ChResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS records;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| ChError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Append-only record log
CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    scope       TEXT NOT NULL,
    log_path    TEXT NOT NULL,
    log_key     TEXT NOT NULL,
    body        TEXT NOT NULL,
    appended_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_log ON records(scope, log_path, log_key, id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='records'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_drop_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        drop_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='records'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
