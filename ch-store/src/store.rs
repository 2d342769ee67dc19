//! The record store contract and its SQLite implementation.
//!
//! A log is addressed by a [`LogKey`]: the scope (course), a path naming the
//! log, and the key records are filed under. Appends never modify earlier
//! records, so "current value for a key" is always the last successful append.

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use ch_core::error::{ChError, ChResult};

use crate::db::Database;

/// Address of one append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogKey {
    pub scope: String,
    pub path: Vec<String>,
    pub key: String,
}

impl LogKey {
    pub fn new<I, S>(scope: impl Into<String>, path: I, key: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: scope.into(),
            path: path.into_iter().map(Into::into).collect(),
            key: key.into(),
        }
    }

    /// Path as stored: segments joined by `/`.
    pub fn path_string(&self) -> String {
        self.path.join("/")
    }
}

impl std::fmt::Display for LogKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.scope, self.path_string(), self.key)
    }
}

/// Order in which `read_all` returns records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrder {
    OldestFirst,
    NewestFirst,
}

impl RecordOrder {
    fn as_sql(&self) -> &str {
        match self {
            RecordOrder::OldestFirst => "ASC",
            RecordOrder::NewestFirst => "DESC",
        }
    }
}

/// Append-only per-key log.
///
/// Implementations must make each append atomic: a reader sees either the
/// whole record or none of it.
pub trait RecordStore: Send + Sync {
    /// Append a record under `log`.
    fn append(&self, log: &LogKey, record: &Value) -> ChResult<()>;

    /// The most recently appended record under `log`, if any.
    fn most_recent(&self, log: &LogKey) -> ChResult<Option<Value>>;

    /// Every record under `log` in the requested order.
    fn read_all(&self, log: &LogKey, order: RecordOrder) -> ChResult<Vec<Value>>;
}

/// Typed helpers over any [`RecordStore`].
pub trait RecordStoreExt: RecordStore {
    fn append_record<T: Serialize>(&self, log: &LogKey, record: &T) -> ChResult<()> {
        let value = serde_json::to_value(record)?;
        self.append(log, &value)
    }

    /// Most recent record decoded as `T`. A record that does not decode is
    /// logged and treated as absent.
    fn most_recent_as<T: DeserializeOwned>(&self, log: &LogKey) -> ChResult<Option<T>> {
        Ok(self.most_recent(log)?.and_then(|value| decode(log, value)))
    }

    /// All records decoded as `T`, skipping any that do not decode.
    fn read_all_as<T: DeserializeOwned>(&self, log: &LogKey, order: RecordOrder) -> ChResult<Vec<T>> {
        Ok(self
            .read_all(log, order)?
            .into_iter()
            .filter_map(|value| decode(log, value))
            .collect())
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}

fn decode<T: DeserializeOwned>(log: &LogKey, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("skipping malformed record in {log}: {e}");
            None
        }
    }
}

impl RecordStore for Database {
    fn append(&self, log: &LogKey, record: &Value) -> ChResult<()> {
        let body = serde_json::to_string(record)?;
        let appended_at = chrono::Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO records (scope, log_path, log_key, body, appended_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![log.scope, log.path_string(), log.key, body, appended_at],
        )
        .map_err(|e| ChError::Database(e.to_string()))?;
        debug!("appended record to {log}");
        Ok(())
    }

    fn most_recent(&self, log: &LogKey) -> ChResult<Option<Value>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM records
                 WHERE scope = ?1 AND log_path = ?2 AND log_key = ?3
                 ORDER BY id DESC LIMIT 1",
                params![log.scope, log.path_string(), log.key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ChError::Database(e.to_string()))?;

        body.map(|b| serde_json::from_str(&b).map_err(ChError::from))
            .transpose()
    }

    fn read_all(&self, log: &LogKey, order: RecordOrder) -> ChResult<Vec<Value>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT body FROM records
             WHERE scope = ?1 AND log_path = ?2 AND log_key = ?3
             ORDER BY id {}",
            order.as_sql()
        );
        let mut stmt = conn.prepare(&sql).map_err(|e| ChError::Database(e.to_string()))?;
        let bodies = stmt
            .query_map(params![log.scope, log.path_string(), log.key], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| ChError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ChError::Database(e.to_string()))?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(ChError::from))
            .collect()
    }
}
