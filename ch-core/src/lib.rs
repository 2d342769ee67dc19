//! coursehelp Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other coursehelp crates:
//! - Application configuration (course, server, store, plugin settings)
//! - Global error type covering every failure category
//! - Structured logging with tracing
//! - Course roles with named capability checks
//! - The per-request context handed to every plugin
//! - Platform directories and common constants

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod logging;
pub mod platform;
pub mod role;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use context::{FormData, RequestContext, Viewer};
pub use error::{ChError, ChResult};
pub use logging::init_logging;
pub use platform::Platform;
pub use role::Role;
