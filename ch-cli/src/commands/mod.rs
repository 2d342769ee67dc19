//! CLI command implementations.

pub mod broadcast;
pub mod config;
pub mod db;
pub mod remote;
pub mod serve;
pub mod token;

use std::sync::Arc;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

use ch_core::config::ConfigHandle;
use ch_core::error::ChResult;
use ch_store::{Database, RecordStore};

/// Helper to initialize the database from config.
pub async fn init_database(config: &ConfigHandle) -> ChResult<Database> {
    let cfg = config.read().await;
    let db_path = cfg.effective_db_path()?;
    Database::init(&db_path, &cfg.database)
}

/// Same database as the trait object plugins expect.
pub fn shared_store(db: &Database) -> Arc<dyn RecordStore> {
    Arc::new(db.clone())
}

/// Table with the CLI's standard styling.
pub fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Truncate a string to a maximum number of characters, appending an ellipsis if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer message", 8), "a lon...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[tokio::test]
    async fn test_init_database_uses_configured_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = ch_core::config::AppConfig::default();
        cfg.database.path = dir.path().join("cli.db").display().to_string();
        let db = init_database(&ConfigHandle::new(cfg)).await.unwrap();
        assert_eq!(db.stats().unwrap().total_records, 0);
        assert!(dir.path().join("cli.db").exists());
    }
}
