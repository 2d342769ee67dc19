//! Write-through file mirror of the latest broadcast.
//!
//! The file holds a single JSON object, overwritten on every successful
//! submit, so a reverse proxy can serve polls without touching the
//! application. It keeps no history and may lag the record store when a
//! write fails; the store stays authoritative.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use ch_core::config::AppConfig;
use ch_core::error::ChResult;
use ch_store::BroadcastRecord;

#[derive(Debug, Clone, Default)]
pub struct BroadcastMirror {
    path: Option<PathBuf>,
}

impl BroadcastMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A mirror that never writes.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn from_config(config: &AppConfig) -> ChResult<Self> {
        if !config.broadcast.mirror_enabled {
            return Ok(Self::disabled());
        }
        Ok(Self::new(config.effective_mirror_path()?))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Overwrite the mirror with `record`. Failures are logged, never returned.
    pub fn publish(&self, record: &BroadcastRecord) {
        let Some(path) = &self.path else {
            return;
        };
        match write_atomic(path, record) {
            Ok(()) => debug!("broadcast mirror updated at {}", path.display()),
            Err(e) => warn!("failed to update broadcast mirror {}: {e}", path.display()),
        }
    }

    /// Current mirror contents, if the file exists and parses.
    pub fn read(&self) -> ChResult<Option<BroadcastRecord>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

fn write_atomic(path: &Path, record: &BroadcastRecord) -> ChResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string(record)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
