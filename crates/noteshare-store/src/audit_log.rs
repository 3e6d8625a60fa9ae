//! Buffered, non-blocking audit recording.
//!
//! `record` enqueues and returns immediately so a slow sink never stalls a
//! response. A dedicated writer task drains the channel into the sink,
//! retrying transient failures; events are only dropped after retries are
//! spent, and never silently. Dropping every `AuditLog` clone closes the
//! channel, and the writer drains the remaining buffer before exiting.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use noteshare_core::{AuditEvent, AuditSink};

/// Append attempts per event before giving up.
const MAX_APPEND_ATTEMPTS: u32 = 3;
/// Pause between retry attempts.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Cloneable recording handle backed by a single writer task.
#[derive(Clone)]
pub struct AuditLog {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl AuditLog {
    /// Spawns the writer task draining into `sink`. The returned join
    /// handle completes once every `AuditLog` clone has been dropped and
    /// the buffer is empty; await it during shutdown to flush.
    #[must_use]
    pub fn spawn(sink: Arc<dyn AuditSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditEvent>();

        let writer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let mut attempt = 1;
                loop {
                    match sink.append(&event).await {
                        Ok(()) => break,
                        Err(e) if attempt < MAX_APPEND_ATTEMPTS => {
                            warn!(
                                kind = event.kind.as_str(),
                                attempt,
                                error = %e,
                                "audit append failed, retrying"
                            );
                            attempt += 1;
                            tokio::time::sleep(RETRY_DELAY).await;
                        }
                        Err(e) => {
                            error!(
                                kind = event.kind.as_str(),
                                note_id = event.note_id.as_deref().unwrap_or("-"),
                                error = %e,
                                "dropping audit event after {MAX_APPEND_ATTEMPTS} attempts"
                            );
                            break;
                        }
                    }
                }
            }
        });

        (Self { tx }, writer)
    }

    /// Enqueues one event. Never blocks.
    pub fn record(&self, event: AuditEvent) {
        if self.tx.send(event).is_err() {
            error!("audit writer is gone; event lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryAuditSink;
    use noteshare_core::{AuditKind, CoreError, CoreResult};

    #[tokio::test]
    async fn records_drain_to_sink_in_order() {
        let sink = MemoryAuditSink::new();
        let (log, writer) = AuditLog::spawn(Arc::new(sink.clone()));

        for i in 0..10 {
            log.record(
                AuditEvent::new(AuditKind::Write, true, "10.0.0.1")
                    .with_size_bytes(i),
            );
        }
        drop(log);
        writer.await.unwrap();

        let events = sink.all();
        assert_eq!(events.len(), 10);
        let sizes: Vec<u64> = events.iter().filter_map(|e| e.size_bytes).collect();
        assert_eq!(sizes, (0..10).collect::<Vec<u64>>());
    }

    /// Sink that fails a fixed number of appends before recovering.
    struct FlakySink {
        inner: MemoryAuditSink,
        failures: parking_lot::Mutex<u32>,
    }

    #[async_trait::async_trait]
    impl AuditSink for FlakySink {
        async fn append(&self, event: &AuditEvent) -> CoreResult<()> {
            {
                let mut failures = self.failures.lock();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(CoreError::storage("transient"));
                }
            }
            self.inner.append(event).await
        }

        async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditEvent>> {
            self.inner.recent(limit).await
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let inner = MemoryAuditSink::new();
        let sink = FlakySink {
            inner: inner.clone(),
            failures: parking_lot::Mutex::new(2),
        };
        let (log, writer) = AuditLog::spawn(Arc::new(sink));

        log.record(AuditEvent::new(AuditKind::Purge, true, "internal"));
        drop(log);
        writer.await.unwrap();

        assert_eq!(inner.all().len(), 1);
    }
}
