//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite in WAL mode with r2d2 connection pooling.
//! Runs integrity checks on startup and applies versioned migrations.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{error, info, warn};

use ch_core::config::DatabaseConfig;
use ch_core::error::{ChError, ChResult};

use crate::migrations;
use crate::schema;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// This:
    /// 1. Creates the database file and parent directories if needed
    /// 2. Sets up connection pooling with WAL and performance pragmas
    /// 3. Runs integrity checks if configured
    /// 4. Creates the schema tables
    /// 5. Runs pending migrations
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> ChResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("initializing database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| ChError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        info!("database initialized successfully");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> ChResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| ChError::Pool(e.to_string()))
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> ChResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| ChError::Database(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(ChError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Per-log record counts.
    pub fn stats(&self) -> ChResult<DatabaseStats> {
        let conn = self.conn()?;

        let total_records: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(|e| ChError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT r.scope, r.log_path, COUNT(*) AS records,
                        (SELECT COUNT(*) FROM current_records c
                          WHERE c.scope = r.scope AND c.log_path = r.log_path) AS keys,
                        MAX(r.appended_at) AS last_append
                 FROM records r
                 GROUP BY r.scope, r.log_path
                 ORDER BY r.scope, r.log_path",
            )
            .map_err(|e| ChError::Database(e.to_string()))?;

        let logs = stmt
            .query_map([], |row| {
                Ok(LogStats {
                    scope: row.get(0)?,
                    log_path: row.get(1)?,
                    records: row.get(2)?,
                    keys: row.get(3)?,
                    last_append: row.get(4)?,
                })
            })
            .map_err(|e| ChError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ChError::Database(e.to_string()))?;

        Ok(DatabaseStats {
            total_records,
            logs,
        })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> ChResult<()> {
        warn!("resetting database - all records will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        conn.execute_batch("DROP VIEW IF EXISTS current_records;")
            .map_err(|e| ChError::Database(e.to_string()))?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)?;
        info!("database reset complete");
        Ok(())
    }
}

/// Record counts for one log.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LogStats {
    pub scope: String,
    pub log_path: String,
    pub records: i64,
    pub keys: i64,
    pub last_append: Option<String>,
}

/// Database row count statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub total_records: i64,
    pub logs: Vec<LogStats>,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "records={}, logs={}", self.total_records, self.logs.len())
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;",
        )?;

        Ok(())
    }
}
