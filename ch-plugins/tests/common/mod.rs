//! Shared test utilities for integration tests.

use std::sync::Arc;

use ch_core::config::DatabaseConfig;
use ch_core::context::{FormData, RequestContext, Viewer};
use ch_core::role::Role;
use ch_store::{Database, RecordStore};
use tempfile::TempDir;

pub const COURSE: &str = "6.101";
pub const URL_ROOT: &str = "https://example.edu/cs";

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let db = Database::init(&path, &DatabaseConfig::default()).expect("failed to init test database");
    (db, dir)
}

/// Same database as a shared trait object, the way plugins hold it.
pub fn shared(db: &Database) -> Arc<dyn RecordStore> {
    Arc::new(db.clone())
}

pub fn viewer(username: &str, role: Role) -> Viewer {
    Viewer::new(username, role)
}

/// Request context for a viewer on `path` with an optional form.
pub fn request(viewer: Option<Viewer>, path: &[&str], form: Option<&[(&str, &str)]>) -> RequestContext {
    let mut ctx = RequestContext::new(COURSE, URL_ROOT)
        .with_path(path.iter().map(|s| s.to_string()).collect());
    ctx.viewer = viewer;
    if let Some(pairs) = form {
        ctx = ctx.with_form(FormData::from_pairs(pairs.iter().copied()));
    }
    ctx
}
