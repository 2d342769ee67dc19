//! coursehelp Store - the append-only record log the plugins read and write.
//!
//! Records are JSON documents appended under a `(scope, path, key)` triple.
//! Nothing is ever updated or deleted: the "current" value for a key is the
//! most recent append. This crate owns the [`RecordStore`] contract, its
//! SQLite implementation (pooling, schema, migrations), and the typed records
//! each plugin stores.

pub mod db;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod store;

// Re-export key types
pub use db::{Database, DbPool};
pub use models::broadcast::{Audience, BroadcastRecord};
pub use models::problem_state::ProblemState;
pub use models::remote_queue::RemoteQueueRecord;
pub use store::{LogKey, RecordOrder, RecordStore, RecordStoreExt};
