//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "coursehelp";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database schema version.
pub const DB_SCHEMA_VERSION: i32 = 1;

/// Log file prefix used by the rolling appender.
pub const LOG_FILE_NAME: &str = "coursehelp.log";

/// Default port for the HTTP adapter.
pub const DEFAULT_PORT: u16 = 3180;

/// Record log names and keys.
pub mod logs {
    /// Log holding every broadcast message.
    pub const BROADCAST: &str = "broadcast_message";
    /// Single key all broadcast records are appended under.
    pub const BROADCAST_KEY: &str = "all";
    /// Log holding remote-queue settings, keyed by username.
    pub const REMOTE_QUEUE: &str = "remote_queue";
    /// Suffix of the per-page problem state key.
    pub const PROBLEM_STATE_SUFFIX: &str = "problemstate";
}

/// Form field names understood by the page plugins.
pub mod fields {
    pub const MSG: &str = "msg";
    pub const EVERYONE: &str = "everyone";
    pub const BROADCAST: &str = "Broadcast";
    pub const GET: &str = "get";
    pub const SAVE: &str = "save";
    pub const URL: &str = "url";
    pub const ACTIVE: &str = "active";
    pub const GO: &str = "go";
    pub const QUEUE_VIEW: &str = "queue_view";
}

/// Content types for raw plugin responses.
pub mod content_types {
    pub const HTML: &str = "text/html";
    pub const JSON: &str = "application/json";
}

/// Whether a checkbox-style form value means "checked".
pub fn is_checked(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes")
}
