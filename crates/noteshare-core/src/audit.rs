//! Audit event domain model for observability and abuse analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Operation class an audit event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditKind {
    /// A note retrieval attempt.
    Read,
    /// A note creation attempt.
    Write,
    /// A sweeper deletion.
    Purge,
}

/// One entry per completed operation attempt.
///
/// Every externally observable API call produces exactly one event,
/// including validation failures and rate-limit rejections. Events are
/// write-only from every other component's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditKind,
    pub success: bool,
    /// Caller network address, or `"internal"` for sweeper-originated events.
    pub host: String,
    /// Subject identifier when known. Stored as a raw string because
    /// malformed requests can carry syntactically invalid ids.
    pub note_id: Option<String>,
    /// Caller-supplied, unverified. Logged only; never used for decisions.
    pub user_id: Option<String>,
    /// Caller-supplied, unverified.
    pub user_plugin_version: Option<String>,
    /// Sum of ciphertext and tag lengths, when applicable.
    pub size_bytes: Option<u64>,
    /// Retention window used, for write events.
    pub expire_window_days: Option<u32>,
    /// Human-readable failure description when `success` is false.
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event stamped with the current time.
    #[must_use]
    pub fn new(kind: AuditKind, success: bool, host: impl Into<String>) -> Self {
        Self {
            kind,
            success,
            host: host.into(),
            note_id: None,
            user_id: None,
            user_plugin_version: None,
            size_bytes: None,
            expire_window_days: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the subject identifier.
    #[must_use]
    pub fn with_note_id(mut self, note_id: impl Into<String>) -> Self {
        self.note_id = Some(note_id.into());
        self
    }

    /// Attach caller-supplied user metadata.
    #[must_use]
    pub fn with_user(mut self, user_id: Option<String>, plugin_version: Option<String>) -> Self {
        self.user_id = user_id;
        self.user_plugin_version = plugin_version;
        self
    }

    /// Attach the payload size.
    #[must_use]
    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Attach the retention window used for a write.
    #[must_use]
    pub fn with_expire_window_days(mut self, days: u32) -> Self {
        self.expire_window_days = Some(days);
        self
    }

    /// Attach a failure description.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl AuditKind {
    /// Convert kind to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Read => "read",
            AuditKind::Write => "write",
            AuditKind::Purge => "purge",
        }
    }
}

impl FromStr for AuditKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(AuditKind::Read),
            "write" => Ok(AuditKind::Write),
            "purge" => Ok(AuditKind::Purge),
            _ => Err(format!("invalid audit kind: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_populates_fields() {
        let event = AuditEvent::new(AuditKind::Write, true, "203.0.113.9")
            .with_note_id("abc")
            .with_user(Some("user".into()), Some("1.2.3".into()))
            .with_size_bytes(42)
            .with_expire_window_days(30);

        assert!(event.success);
        assert_eq!(event.kind, AuditKind::Write);
        assert_eq!(event.note_id.as_deref(), Some("abc"));
        assert_eq!(event.size_bytes, Some(42));
        assert_eq!(event.expire_window_days, Some(30));
        assert!(event.error.is_none());
    }

    #[test]
    fn kind_string_roundtrip() {
        for kind in [AuditKind::Read, AuditKind::Write, AuditKind::Purge] {
            assert_eq!(kind.as_str().parse::<AuditKind>().unwrap(), kind);
        }
        assert!("delete".parse::<AuditKind>().is_err());
    }
}
