//! API state management
//!
//! Shared state for the API server: the note store, the audit recording
//! handle, the rate limiter, and resolved configuration.

use noteshare_core::{Config, RateLimiter};
use noteshare_store::{AuditLog, NoteStore};
use std::sync::Arc;

/// Shared application state for the API server
#[derive(Clone)]
pub struct AppState {
    /// Expiry-aware note store
    pub store: Arc<NoteStore>,
    /// Non-blocking audit recording handle
    pub audit: AuditLog,
    /// Per-client request limiter, passed explicitly (no global singleton)
    pub limiter: Arc<RateLimiter>,
    /// Resolved service configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        store: Arc<NoteStore>,
        audit: AuditLog,
        limiter: Arc<RateLimiter>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            audit,
            limiter,
            config,
        }
    }

    /// Public URL a stored note is reachable under.
    pub fn view_url(&self, id: &str) -> String {
        format!(
            "{}/note/{}",
            self.config.server.public_url.trim_end_matches('/'),
            id
        )
    }
}
