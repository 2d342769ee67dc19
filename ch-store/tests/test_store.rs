//! Integration tests for the record store.
//!
//! Covers database creation, WAL mode, append/most-recent semantics across
//! keys, typed records, and reopening an existing file.

mod common;

use ch_core::config::DatabaseConfig;
use ch_core::constants::{logs, DB_SCHEMA_VERSION};
use ch_store::migrations;
use ch_store::{
    Audience, BroadcastRecord, Database, LogKey, ProblemState, RecordOrder, RecordStore,
    RecordStoreExt, RemoteQueueRecord,
};
use serde_json::json;

// ---- Database initialization ----

#[test]
fn database_init_creates_file_and_wal_mode() {
    let (db, dir) = common::create_test_db();
    assert!(dir.path().join("test.db").exists());

    let conn = db.conn().unwrap();
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal");
}

#[test]
fn database_init_sets_schema_version() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    assert_eq!(migrations::get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("persist.db");
    let log = LogKey::new("6.101", [logs::REMOTE_QUEUE], "alice");

    {
        let db = Database::init(&path, &DatabaseConfig::default()).unwrap();
        db.append_record(&log, &RemoteQueueRecord::new("http://x", true)).unwrap();
    }

    let db = Database::init(&path, &DatabaseConfig::default()).unwrap();
    let record: Option<RemoteQueueRecord> = db.most_recent_as(&log).unwrap();
    assert_eq!(record, Some(RemoteQueueRecord::new("http://x", true)));
}

// ---- Append semantics ----

#[test]
fn current_value_is_last_append_per_key() {
    let (db, _dir) = common::create_test_db();
    let alice = LogKey::new("6.101", [logs::REMOTE_QUEUE], "alice");
    let bob = LogKey::new("6.101", [logs::REMOTE_QUEUE], "bob");

    db.append_record(&alice, &RemoteQueueRecord::new("http://a1", true)).unwrap();
    db.append_record(&bob, &RemoteQueueRecord::new("http://b", true)).unwrap();
    db.append_record(&alice, &RemoteQueueRecord::new("http://a2", false)).unwrap();

    let a: RemoteQueueRecord = db.most_recent_as(&alice).unwrap().unwrap();
    let b: RemoteQueueRecord = db.most_recent_as(&bob).unwrap().unwrap();
    assert_eq!(a, RemoteQueueRecord::new("http://a2", false));
    assert_eq!(b, RemoteQueueRecord::new("http://b", true));

    let history = db.read_all(&alice, RecordOrder::OldestFirst).unwrap();
    assert_eq!(history.len(), 2, "appends never overwrite earlier records");
}

#[test]
fn broadcast_history_newest_first() {
    let (db, _dir) = common::create_test_db();
    let log = LogKey::new("6.101", [logs::BROADCAST], logs::BROADCAST_KEY);

    for msg in ["one", "two", "three"] {
        db.append_record(&log, &BroadcastRecord::new_now(msg, "ta", Audience::All))
            .unwrap();
    }

    let all: Vec<BroadcastRecord> = db.read_all_as(&log, RecordOrder::NewestFirst).unwrap();
    let msgs: Vec<&str> = all.iter().map(|r| r.msg.as_str()).collect();
    assert_eq!(msgs, vec!["three", "two", "one"]);
}

#[test]
fn concurrent_appends_are_all_recorded() {
    let (db, _dir) = common::create_test_db();
    let log = LogKey::new("c", ["counter"], "k");

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let db = db.clone();
            let log = log.clone();
            std::thread::spawn(move || db.append(&log, &json!({ "n": n })).unwrap())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(db.read_all(&log, RecordOrder::OldestFirst).unwrap().len(), 8);
}

// ---- Problem state ----

#[test]
fn problem_state_read_from_user_log() {
    let (db, _dir) = common::create_test_db();
    let path_info = vec!["6.101".to_string(), "week1".into(), "lab".into()];
    let key = ProblemState::log_key("6.101", "alice", &path_info);

    db.append(&key, &json!({"scores": {"q1": 1.0, "q2": 0.0}})).unwrap();

    let state: ProblemState = db.most_recent_as(&key).unwrap().unwrap();
    assert!(state.is_complete("q1"));
    assert!(!state.is_complete("q2"));
    assert!(!state.is_complete("q3"));
}

// ---- Stats ----

#[test]
fn stats_group_by_log() {
    let (db, _dir) = common::create_test_db();
    db.append(&LogKey::new("c", [logs::BROADCAST], logs::BROADCAST_KEY), &json!({}))
        .unwrap();
    db.append(&LogKey::new("c", [logs::REMOTE_QUEUE], "alice"), &json!({}))
        .unwrap();

    let stats = db.stats().unwrap();
    assert_eq!(stats.total_records, 2);
    let paths: Vec<&str> = stats.logs.iter().map(|l| l.log_path.as_str()).collect();
    assert_eq!(paths, vec![logs::BROADCAST, logs::REMOTE_QUEUE]);
}
