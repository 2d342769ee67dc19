//! Bearer token management and validation.
//!
//! Generates random tokens shared between the hosting framework and this
//! adapter. Every route except `/health` requires `Authorization: Bearer <token>`.

use std::sync::Arc;

use base64::Engine;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

/// Manages bearer token authentication for the HTTP adapter.
pub struct ServerAuth {
    token: Arc<RwLock<String>>,
}

impl Default for ServerAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerAuth {
    /// Create a ServerAuth with a freshly generated random token.
    pub fn new() -> Self {
        debug!("server auth initialized with new token");
        Self::with_token(generate_token())
    }

    /// Create a ServerAuth using a configured token.
    pub fn with_token(token: String) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Use the configured token, or generate one when none is set.
    pub fn from_config_token(token: &str) -> Self {
        if token.trim().is_empty() {
            Self::new()
        } else {
            Self::with_token(token.trim().to_string())
        }
    }

    /// Validate an `Authorization` header value.
    /// Expects format: `Bearer <token>`.
    pub async fn validate(&self, header: &str) -> bool {
        let expected = self.token.read().await;
        match header.strip_prefix("Bearer ") {
            Some(provided) => !expected.is_empty() && provided.trim() == expected.as_str(),
            None => false,
        }
    }

    /// Return the current token value.
    pub async fn current_token(&self) -> String {
        self.token.read().await.clone()
    }

    /// Generate a new token, replacing the old one.
    pub async fn regenerate(&self) -> String {
        let new_token = generate_token();
        *self.token.write().await = new_token.clone();
        debug!("server token regenerated");
        new_token
    }
}

/// Generate a 32-byte random token encoded as base64url (no padding).
/// Produces a 43-character string.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
