//! Application configuration management.
//!
//! Handles loading, saving, and accessing configuration for the course site,
//! the HTTP adapter, the record store and each plugin. Configuration is
//! persisted as TOML on disk and every field has a default.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::constants::DEFAULT_PORT;
use crate::error::{ChError, ChResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Course identity and public URL.
    #[serde(default)]
    pub course: CourseConfig,

    /// HTTP adapter settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Broadcast plugin settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Help-queue injector settings.
    #[serde(default)]
    pub help_queue: HelpQueueConfig,
}

/// Course identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Course identifier; used as the record-store scope.
    #[serde(default = "default_course_name")]
    pub name: String,

    /// Public URL root of the course site (e.g. "https://example.edu/cat-soop").
    #[serde(default)]
    pub url_root: String,
}

/// HTTP adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token the hosting framework must present. Empty means a fresh
    /// token is generated at startup and logged.
    #[serde(default)]
    pub auth_token: String,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. If empty, uses default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// Broadcast plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// File the latest broadcast is mirrored to for the reverse proxy.
    /// A leading `~/` is expanded.
    #[serde(default = "default_mirror_path")]
    pub mirror_path: String,

    /// Whether to write the mirror file at all.
    #[serde(default = "default_true")]
    pub mirror_enabled: bool,
}

/// Help-queue injector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpQueueConfig {
    /// Public URL root of the queue client assets.
    #[serde(default)]
    pub url_root: String,

    /// Room name; unset for multi-room deployments.
    #[serde(default)]
    pub room: Option<String>,

    /// Stylesheets under `<url_root>/css`.
    #[serde(default = "default_stylesheets")]
    pub stylesheets: Vec<String>,

    /// Scripts under `<url_root>/js`.
    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,
}

// Default value functions for serde

fn default_course_name() -> String {
    "course".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mirror_path() -> String {
    "~/cs_broadcast.json".to_string()
}

fn default_stylesheets() -> Vec<String> {
    vec!["queue.css".to_string()]
}

fn default_scripts() -> Vec<String> {
    vec!["queue.js".to_string()]
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            name: default_course_name(),
            url_root: String::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            auth_token: String::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            mirror_path: default_mirror_path(),
            mirror_enabled: true,
        }
    }
}

impl Default for HelpQueueConfig {
    fn default() -> Self {
        Self {
            url_root: String::new(),
            room: None,
            stylesheets: default_stylesheets(),
            scripts: default_scripts(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path, falling back to
    /// defaults when the file does not exist.
    pub fn load_default() -> ChResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> ChResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> ChResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ChError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> ChResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Get the effective database path, using the configured path or the default.
    pub fn effective_db_path(&self) -> ChResult<PathBuf> {
        if self.database.path.is_empty() {
            Ok(Platform::data_dir()?.join("coursehelp.db"))
        } else {
            Platform::expand_home(&self.database.path)
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> ChResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Platform::expand_home(&self.logging.directory)
        }
    }

    /// Get the broadcast mirror file path with `~` expanded.
    pub fn effective_mirror_path(&self) -> ChResult<PathBuf> {
        if self.broadcast.mirror_path.trim().is_empty() {
            return Err(ChError::MissingConfig("broadcast.mirror_path".into()));
        }
        Platform::expand_home(&self.broadcast.mirror_path)
    }

    /// Strip whitespace, surrounding quotes and trailing slashes from a URL root.
    pub fn sanitize_url_root(url: &str) -> String {
        url.trim().trim_matches('"').trim().trim_end_matches('/').to_string()
    }
}

/// Thread-safe configuration holder for shared access across tasks.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the handle.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}
