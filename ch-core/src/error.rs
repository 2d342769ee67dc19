//! Global error types for coursehelp.
//!
//! All error categories across the workspace are unified into a single
//! `ChError` enum with conversions from underlying library errors.
//!
//! Page plugins never surface `AuthorizationDenied` or `Validation` to the
//! host as failures: the former renders as empty output, the latter as inline
//! feedback on the form. Store errors propagate unchanged.

use thiserror::Error;

/// Convenience type alias for Results using ChError.
pub type ChResult<T> = Result<T, ChError>;

/// Unified error type covering all error categories in coursehelp.
#[derive(Error, Debug)]
pub enum ChError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Record store errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Request errors --
    /// The acting user lacks the capability for a staff-only action.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// A required form field was empty or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// HTTP adapter error (bind, malformed request).
    #[error("http error: {0}")]
    Http(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChError {
    /// Whether this error means the record store could not serve the request.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            ChError::Database(_) | ChError::Pool(_) | ChError::IntegrityCheck(_) | ChError::Migration(_)
        )
    }
}

impl From<serde_json::Error> for ChError {
    fn from(e: serde_json::Error) -> Self {
        ChError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for ChError {
    fn from(e: toml::de::Error) -> Self {
        ChError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ch_error_display() {
        let err = ChError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");

        let err = ChError::Validation("empty message".to_string());
        assert_eq!(err.to_string(), "validation error: empty message");
    }

    #[test]
    fn test_store_unavailable_classification() {
        assert!(ChError::Database("locked".into()).is_store_unavailable());
        assert!(ChError::Pool("timed out".into()).is_store_unavailable());
        assert!(!ChError::Validation("x".into()).is_store_unavailable());
        assert!(!ChError::AuthorizationDenied("x".into()).is_store_unavailable());
    }

    #[test]
    fn test_json_error_converts() {
        let bad: Result<serde_json::Value, _> = serde_json::from_str("{nope");
        let err: ChError = bad.unwrap_err().into();
        assert!(matches!(err, ChError::Serialization(_)));
    }
}
