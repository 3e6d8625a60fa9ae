//! Expiry-aware CRUD over the note backend.

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use noteshare_core::{CoreError, CoreResult, Note, NoteBackend, NoteId};

/// Bounded retries for identifier assignment. Collisions in the 48-bit
/// random space are exceedingly unlikely but not impossible.
const MAX_ID_ATTEMPTS: u32 = 8;

/// Note store: creation with identifier assignment, expiry-aware reads,
/// and the purge primitive invoked by the sweeper.
#[derive(Clone)]
pub struct NoteStore {
    backend: Arc<dyn NoteBackend>,
    retention: Duration,
}

impl NoteStore {
    /// Create a store retaining notes for `note_ttl_days`.
    #[must_use]
    pub fn new(backend: Arc<dyn NoteBackend>, note_ttl_days: u32) -> Self {
        Self {
            backend,
            retention: Duration::days(i64::from(note_ttl_days)),
        }
    }

    /// Retention window applied to new notes, in whole days.
    #[must_use]
    pub fn retention_days(&self) -> u32 {
        self.retention.num_days() as u32
    }

    /// Persists a new note under a freshly assigned identifier and returns
    /// it with server-set timestamps.
    ///
    /// # Errors
    ///
    /// `IdentifierExhausted` when every generation attempt collided;
    /// `Storage` when the backend fails.
    pub async fn create(
        &self,
        ciphertext: Bytes,
        hmac: Bytes,
        crypto_version: String,
    ) -> CoreResult<Note> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let now = Utc::now();
            let note = Note {
                id: NoteId::generate(),
                ciphertext: ciphertext.clone(),
                hmac: hmac.clone(),
                crypto_version: crypto_version.clone(),
                insert_time: now,
                expire_time: now + self.retention,
            };

            match self.backend.insert(&note).await {
                Ok(()) => {
                    debug!(note_id = %note.id, expire_time = %note.expire_time, "note created");
                    return Ok(note);
                }
                Err(CoreError::AlreadyExists { id }) => {
                    warn!(note_id = %id, attempt, "identifier collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::IdentifierExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Resolves a note by its raw identifier string.
    ///
    /// A syntactically invalid id is `NotFound`, never `Gone` — the codec
    /// check runs before storage is touched. A present record is returned
    /// even when its retention window has elapsed: only the sweeper
    /// transitions a record to deleted, so a reader racing the sweeper just
    /// sees the note one last time. An absent record resolves to `Gone`
    /// when a tombstone exists and `NotFound` otherwise.
    pub async fn read(&self, raw_id: &str) -> CoreResult<Note> {
        let id = match NoteId::parse(raw_id) {
            Ok(id) => id,
            Err(reason) => {
                debug!(raw_id, %reason, "identifier failed validation");
                return Err(CoreError::not_found(raw_id));
            }
        };

        if let Some(note) = self.backend.fetch(id).await? {
            return Ok(note);
        }

        if self.backend.has_tombstone(id).await? {
            Err(CoreError::gone(raw_id))
        } else {
            Err(CoreError::not_found(raw_id))
        }
    }

    /// Deletes every note whose retention window has elapsed, recording a
    /// tombstone per deleted id, and returns the deleted notes. Only the
    /// sweeper calls this.
    pub async fn purge_expired(&self) -> CoreResult<Vec<Note>> {
        self.backend.remove_expired(Utc::now()).await
    }

    /// Drops tombstones older than the cutoff; returns the count removed.
    pub async fn prune_tombstones(&self, cutoff: DateTime<Utc>) -> CoreResult<usize> {
        self.backend.prune_tombstones(cutoff).await
    }
}
