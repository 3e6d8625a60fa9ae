//! Periodic purge of expired notes.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::audit_log::AuditLog;
use crate::store::NoteStore;
use noteshare_core::{AuditEvent, AuditKind, CoreResult};

/// Host field recorded on sweeper-originated audit events.
const SWEEPER_HOST: &str = "internal";

/// Expiry sweeper: deletes notes past their retention window, records their
/// tombstones, and prunes tombstones past the tombstone horizon.
///
/// Sweeps are serialized through an async mutex so an overlapping
/// timer-triggered cycle waits for the previous one instead of racing it;
/// combined with the backend's atomic delete-plus-tombstone, a second sweep
/// finds nothing left to purge and deletes run exactly once.
///
/// # Example
///
/// ```no_run
/// use noteshare_store::{AuditLog, ExpirySweeper, MemoryAuditSink, MemoryNoteBackend, NoteStore};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() {
/// let store = Arc::new(NoteStore::new(Arc::new(MemoryNoteBackend::new()), 30));
/// let (audit, _writer) = AuditLog::spawn(Arc::new(MemoryAuditSink::new()));
/// let mut sweeper = ExpirySweeper::new(store, audit, Duration::from_secs(60), 90);
/// sweeper.start_worker();
/// # }
/// ```
pub struct ExpirySweeper {
    store: Arc<NoteStore>,
    audit: AuditLog,
    interval: Duration,
    tombstone_ttl: ChronoDuration,
    gate: Arc<Mutex<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    /// Create a sweeper running every `interval`, keeping tombstones for
    /// `tombstone_ttl_days`.
    #[must_use]
    pub fn new(
        store: Arc<NoteStore>,
        audit: AuditLog,
        interval: Duration,
        tombstone_ttl_days: u32,
    ) -> Self {
        Self {
            store,
            audit,
            interval,
            tombstone_ttl: ChronoDuration::days(i64::from(tombstone_ttl_days)),
            gate: Arc::new(Mutex::new(())),
            worker: None,
        }
    }

    /// Start the background worker.
    pub fn start_worker(&mut self) {
        if self.worker.is_some() {
            tracing::warn!("sweep worker already running");
            return;
        }

        let sweeper = self.clone_for_worker();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so startup isn't
            // dominated by a sweep.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if let Err(e) = sweeper.run_sweep_cycle().await {
                    tracing::error!(error = %e, "sweep cycle failed");
                }
            }
        });

        self.worker = Some(handle);
        tracing::info!(interval = ?self.interval, "sweep worker started");
    }

    /// Run one sweep cycle and return the number of notes purged.
    ///
    /// Called by the background worker; also invoked directly by tests and
    /// operator tooling. Running when nothing is expired is a no-op
    /// returning zero.
    pub async fn run_sweep_cycle(&self) -> CoreResult<usize> {
        let _guard = self.gate.lock().await;
        let start = std::time::Instant::now();

        let purged = self.store.purge_expired().await?;
        for note in &purged {
            self.audit.record(
                AuditEvent::new(AuditKind::Purge, true, SWEEPER_HOST)
                    .with_note_id(note.id.as_str())
                    .with_size_bytes(note.size_bytes()),
            );
        }

        let horizon = Utc::now() - self.tombstone_ttl;
        let pruned = self.store.prune_tombstones(horizon).await?;

        if !purged.is_empty() || pruned > 0 {
            tracing::info!(
                purged = purged.len(),
                tombstones_pruned = pruned,
                duration_ms = start.elapsed().as_millis(),
                "sweep cycle complete"
            );
        }

        Ok(purged.len())
    }

    /// Shutdown the background worker.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.worker.take() {
            handle.abort();
            tracing::info!("sweep worker shut down");
        }
    }

    /// Clone for worker (without JoinHandle).
    fn clone_for_worker(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: self.audit.clone(),
            interval: self.interval,
            tombstone_ttl: self.tombstone_ttl,
            gate: Arc::clone(&self.gate),
            worker: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryAuditSink, MemoryNoteBackend};
    use bytes::Bytes;
    use noteshare_core::{Note, NoteBackend, NoteId, DEFAULT_CRYPTO_VERSION};

    async fn seed_expired(backend: &MemoryNoteBackend, payload: &'static [u8]) -> NoteId {
        let now = Utc::now();
        let note = Note {
            id: NoteId::generate(),
            ciphertext: Bytes::from_static(payload),
            hmac: Bytes::from_static(b"tag!"),
            crypto_version: DEFAULT_CRYPTO_VERSION.to_string(),
            insert_time: now - ChronoDuration::days(31),
            expire_time: now - ChronoDuration::days(1),
        };
        backend.insert(&note).await.unwrap();
        note.id
    }

    fn sweeper_over(
        backend: &MemoryNoteBackend,
        sink: &MemoryAuditSink,
    ) -> ExpirySweeper {
        let store = Arc::new(NoteStore::new(Arc::new(backend.clone()), 30));
        let (audit, _writer) = AuditLog::spawn(Arc::new(sink.clone()));
        ExpirySweeper::new(store, audit, Duration::from_secs(3600), 90)
    }

    #[tokio::test]
    async fn sweep_purges_and_emits_one_event_per_note() {
        let backend = MemoryNoteBackend::new();
        let sink = MemoryAuditSink::new();
        let id = seed_expired(&backend, b"twelve bytes").await;

        let sweeper = sweeper_over(&backend, &sink);
        assert_eq!(sweeper.run_sweep_cycle().await.unwrap(), 1);

        // Give the writer task a beat to drain.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let events = sink.all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AuditKind::Purge);
        assert!(events[0].success);
        assert_eq!(events[0].note_id.as_deref(), Some(id.as_str()));
        assert_eq!(events[0].size_bytes, Some(16));
        assert_eq!(events[0].host, "internal");
    }

    #[tokio::test]
    async fn empty_sweep_is_a_noop() {
        let backend = MemoryNoteBackend::new();
        let sink = MemoryAuditSink::new();
        let sweeper = sweeper_over(&backend, &sink);

        assert_eq!(sweeper.run_sweep_cycle().await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sink.all().is_empty());
    }

    #[tokio::test]
    async fn repeated_sweeps_never_double_log() {
        let backend = MemoryNoteBackend::new();
        let sink = MemoryAuditSink::new();
        seed_expired(&backend, b"payload").await;

        let sweeper = sweeper_over(&backend, &sink);
        assert_eq!(sweeper.run_sweep_cycle().await.unwrap(), 1);
        assert_eq!(sweeper.run_sweep_cycle().await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.all().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_sweeps_purge_exactly_once() {
        let backend = MemoryNoteBackend::new();
        let sink = MemoryAuditSink::new();
        for _ in 0..5 {
            seed_expired(&backend, b"dup").await;
        }

        let sweeper = Arc::new(sweeper_over(&backend, &sink));
        let mut tasks = Vec::new();
        for _ in 0..4 {
            let sweeper = Arc::clone(&sweeper);
            tasks.push(tokio::spawn(async move {
                sweeper.run_sweep_cycle().await.unwrap()
            }));
        }

        let mut total = 0;
        for task in tasks {
            total += task.await.unwrap();
        }
        assert_eq!(total, 5);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.all().len(), 5);
    }
}
