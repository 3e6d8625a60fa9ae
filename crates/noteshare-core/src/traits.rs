use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::audit::AuditEvent;
use crate::error::CoreResult;
use crate::ids::NoteId;
use crate::note::Note;

/// Persistence interface for notes and their tombstones.
///
/// Implementations must provide atomic create-with-uniqueness-check, atomic
/// read, and atomic delete-plus-tombstone for purges; these are the only
/// shared-state guarantees the store layer relies on.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    /// Persists a new note. Fails with `CoreError::AlreadyExists` when the
    /// identifier is taken.
    async fn insert(&self, note: &Note) -> CoreResult<()>;

    /// Fetches a note by identifier, expired or not.
    async fn fetch(&self, id: NoteId) -> CoreResult<Option<Note>>;

    /// Deletes every note with `expire_time <= cutoff`, writing a tombstone
    /// per deleted id in the same atomic step, and returns the deleted
    /// notes. A concurrent second call finds nothing left to purge.
    async fn remove_expired(&self, cutoff: DateTime<Utc>) -> CoreResult<Vec<Note>>;

    /// True when a tombstone exists for the identifier.
    async fn has_tombstone(&self, id: NoteId) -> CoreResult<bool>;

    /// Drops tombstones purged at or before the cutoff, returning the count
    /// removed. Ids pruned here degrade from "Gone" to "Not Found".
    async fn prune_tombstones(&self, cutoff: DateTime<Utc>) -> CoreResult<usize>;
}

/// Append-only sink for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one event.
    async fn append(&self, event: &AuditEvent) -> CoreResult<()>;

    /// Returns up to `limit` most recent events, newest first. Operator
    /// tooling only; no request path reads audit entries back.
    async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditEvent>>;
}
