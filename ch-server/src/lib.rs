//! coursehelp Server - a small HTTP adapter around the plugins.
//!
//! The hosting framework (or the reverse proxy in front of it) forwards page
//! requests and render hooks here, passing the authenticated identity in
//! trusted headers and a shared bearer token.

pub mod auth;
pub mod form;
pub mod server;
pub mod state;

pub use auth::ServerAuth;
pub use server::{bind, serve};
pub use state::AppState;

/// Header carrying the authenticated username.
pub const USER_HEADER: &str = "x-coursehelp-user";

/// Header carrying the viewer's course role.
pub const ROLE_HEADER: &str = "x-coursehelp-role";
