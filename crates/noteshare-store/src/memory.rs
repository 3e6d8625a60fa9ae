//! In-memory backend implementations.
//!
//! The default runtime backend and the reference implementation for the
//! backend contract in tests. All mutations on a single identifier happen
//! under one write lock, which gives the atomic insert-with-uniqueness and
//! delete-plus-tombstone guarantees the store layer requires.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use noteshare_core::{
    AuditEvent, AuditSink, CoreError, CoreResult, Note, NoteBackend, NoteId, Tombstone,
};

#[derive(Default)]
struct Shelves {
    notes: HashMap<NoteId, Note>,
    tombstones: HashMap<NoteId, Tombstone>,
}

/// In-memory note backend.
#[derive(Clone, Default)]
pub struct MemoryNoteBackend {
    inner: Arc<RwLock<Shelves>>,
}

impl MemoryNoteBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-tombstoned) notes. Test helper.
    #[must_use]
    pub fn note_count(&self) -> usize {
        self.inner.read().notes.len()
    }

    /// Number of tombstones currently retained. Test helper.
    #[must_use]
    pub fn tombstone_count(&self) -> usize {
        self.inner.read().tombstones.len()
    }
}

#[async_trait]
impl NoteBackend for MemoryNoteBackend {
    async fn insert(&self, note: &Note) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if inner.notes.contains_key(&note.id) || inner.tombstones.contains_key(&note.id) {
            return Err(CoreError::already_exists(note.id.as_str()));
        }
        inner.notes.insert(note.id, note.clone());
        Ok(())
    }

    async fn fetch(&self, id: NoteId) -> CoreResult<Option<Note>> {
        Ok(self.inner.read().notes.get(&id).cloned())
    }

    async fn remove_expired(&self, cutoff: DateTime<Utc>) -> CoreResult<Vec<Note>> {
        let mut inner = self.inner.write();
        let expired: Vec<NoteId> = inner
            .notes
            .values()
            .filter(|n| n.expire_time <= cutoff)
            .map(|n| n.id)
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(note) = inner.notes.remove(&id) {
                inner.tombstones.insert(
                    id,
                    Tombstone {
                        id,
                        purged_at: cutoff,
                    },
                );
                removed.push(note);
            }
        }
        Ok(removed)
    }

    async fn has_tombstone(&self, id: NoteId) -> CoreResult<bool> {
        Ok(self.inner.read().tombstones.contains_key(&id))
    }

    async fn prune_tombstones(&self, cutoff: DateTime<Utc>) -> CoreResult<usize> {
        let mut inner = self.inner.write();
        let before = inner.tombstones.len();
        inner.tombstones.retain(|_, t| t.purged_at > cutoff);
        Ok(before - inner.tombstones.len())
    }
}

/// In-memory append-only audit sink.
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event in append order. Test helper.
    #[must_use]
    pub fn all(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, event: &AuditEvent) -> CoreResult<()> {
        self.events.write().push(event.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditEvent>> {
        let events = self.events.read();
        Ok(events.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Duration;
    use noteshare_core::DEFAULT_CRYPTO_VERSION;

    fn note_expiring_at(expire_time: DateTime<Utc>) -> Note {
        Note {
            id: NoteId::generate(),
            ciphertext: Bytes::from_static(b"ciphertext"),
            hmac: Bytes::from_static(b"tag"),
            crypto_version: DEFAULT_CRYPTO_VERSION.to_string(),
            insert_time: Utc::now(),
            expire_time,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let backend = MemoryNoteBackend::new();
        let note = note_expiring_at(Utc::now() + Duration::days(30));

        backend.insert(&note).await.unwrap();
        let err = backend.insert(&note).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn remove_expired_writes_tombstones_atomically() {
        let backend = MemoryNoteBackend::new();
        let expired = note_expiring_at(Utc::now() - Duration::hours(1));
        let live = note_expiring_at(Utc::now() + Duration::days(30));
        backend.insert(&expired).await.unwrap();
        backend.insert(&live).await.unwrap();

        let removed = backend.remove_expired(Utc::now()).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, expired.id);

        assert!(backend.fetch(expired.id).await.unwrap().is_none());
        assert!(backend.has_tombstone(expired.id).await.unwrap());
        assert!(backend.fetch(live.id).await.unwrap().is_some());
        assert!(!backend.has_tombstone(live.id).await.unwrap());
    }

    #[tokio::test]
    async fn second_sweep_finds_nothing() {
        let backend = MemoryNoteBackend::new();
        let expired = note_expiring_at(Utc::now() - Duration::hours(1));
        backend.insert(&expired).await.unwrap();

        assert_eq!(backend.remove_expired(Utc::now()).await.unwrap().len(), 1);
        assert_eq!(backend.remove_expired(Utc::now()).await.unwrap().len(), 0);
        assert_eq!(backend.tombstone_count(), 1);
    }

    #[tokio::test]
    async fn prune_drops_old_tombstones_only() {
        let backend = MemoryNoteBackend::new();
        let expired = note_expiring_at(Utc::now() - Duration::hours(1));
        backend.insert(&expired).await.unwrap();
        backend.remove_expired(Utc::now()).await.unwrap();

        // Horizon in the past keeps the fresh tombstone.
        let kept = backend
            .prune_tombstones(Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(kept, 0);
        assert!(backend.has_tombstone(expired.id).await.unwrap());

        // Horizon in the future prunes it.
        let pruned = backend
            .prune_tombstones(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(pruned, 1);
        assert!(!backend.has_tombstone(expired.id).await.unwrap());
    }

    #[tokio::test]
    async fn audit_sink_returns_newest_first() {
        use noteshare_core::AuditKind;

        let sink = MemoryAuditSink::new();
        for i in 0..5 {
            let event = AuditEvent::new(AuditKind::Read, true, format!("10.0.0.{i}"));
            sink.append(&event).await.unwrap();
        }

        let recent = sink.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].host, "10.0.0.4");
        assert_eq!(recent[1].host, "10.0.0.3");
    }
}
