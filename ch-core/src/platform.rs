//! Platform directories and path helpers.

use std::path::PathBuf;

use crate::error::{ChError, ChResult};

/// Platform directory lookups.
pub struct Platform;

impl Platform {
    /// Platform-specific data directory (database, logs).
    ///
    /// - Windows: `%APPDATA%/coursehelp`
    /// - macOS: `~/Library/Application Support/coursehelp`
    /// - Linux: `~/.local/share/coursehelp`
    pub fn data_dir() -> ChResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| ChError::Config("could not determine data directory".into()))?;
        Ok(base.join("coursehelp"))
    }

    /// Platform-specific configuration directory.
    pub fn config_dir() -> ChResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| ChError::Config("could not determine config directory".into()))?;
        Ok(base.join("coursehelp"))
    }

    /// Expand a leading `~/` to the current user's home directory.
    ///
    /// Paths without the prefix are returned unchanged.
    pub fn expand_home(path: &str) -> ChResult<PathBuf> {
        if path == "~" {
            return dirs::home_dir()
                .ok_or_else(|| ChError::Config("could not determine home directory".into()));
        }
        match path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir()
                    .ok_or_else(|| ChError::Config("could not determine home directory".into()))?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(path)),
        }
    }
}
