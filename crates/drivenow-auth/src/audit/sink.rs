//! Fire-and-forget audit sink.
//!
//! Callers hand events to [`AuditSink::record`], which only enqueues them.
//! A detached writer task drains the queue into an [`AuditStorage`]. A full
//! or closed queue drops the event with a warning, and a failed write is
//! logged. Neither ever reaches the caller.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use super::event::{AuditEvent, AuditOutcome, AuditSource, Severity};
use crate::AuthResult;
use crate::storage::AuditStorage;

/// Anything that accepts audit events without making the caller wait.
pub trait AuditRecorder: Send + Sync {
    /// Queue an event for persistence.
    fn record(&self, event: AuditEvent);

    /// Convenience wrapper taking the event fields directly.
    fn record_event(
        &self,
        action: &str,
        message: &str,
        severity: Severity,
        source: &AuditSource,
        outcome: AuditOutcome,
    ) {
        self.record(
            AuditEvent::builder(action, message)
                .severity(severity)
                .outcome(outcome)
                .source(source)
                .build(),
        );
    }
}

enum SinkCommand {
    Append(AuditEvent),
    Flush(oneshot::Sender<()>),
}

/// Queue-backed audit sink.
///
/// Cloning is cheap; all clones feed the same writer task.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<SinkCommand>,
    storage: Arc<dyn AuditStorage>,
}

impl AuditSink {
    /// Starts the writer task and returns a handle to its queue.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(storage: Arc<dyn AuditStorage>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_writer(storage.clone(), rx));
        Self { tx, storage }
    }

    /// Waits until every event queued before this call has been handled.
    ///
    /// Returns immediately if the writer task has stopped.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(SinkCommand::Flush(done_tx)).await.is_err() {
            return;
        }
        let _ = done_rx.await;
    }

    /// Most recent events, newest first.
    ///
    /// Reads go straight to storage, so events still in the queue are not
    /// visible until the writer catches up.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub async fn list_recent(&self, limit: usize) -> AuthResult<Vec<AuditEvent>> {
        self.storage.list_recent(limit).await
    }
}

impl AuditRecorder for AuditSink {
    fn record(&self, event: AuditEvent) {
        let action = event.action.clone();
        match self.tx.try_send(SinkCommand::Append(event)) {
            Ok(()) => debug!(action = %action, "Audit event queued"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(action = %action, "Audit queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(action = %action, "Audit writer stopped, dropping event");
            }
        }
    }
}

impl std::fmt::Debug for AuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSink")
            .field("capacity", &self.tx.max_capacity())
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

async fn run_writer(storage: Arc<dyn AuditStorage>, mut rx: mpsc::Receiver<SinkCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            SinkCommand::Append(event) => {
                if let Err(e) = storage.append(&event).await {
                    error!(
                        error = %e,
                        audit_id = %event.id,
                        action = %event.action,
                        "Failed to store audit event"
                    );
                }
            }
            SinkCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Audit writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{RwLock, Semaphore};

    #[derive(Default)]
    struct VecStorage {
        events: RwLock<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditStorage for VecStorage {
        async fn append(&self, event: &AuditEvent) -> AuthResult<()> {
            self.events.write().await.push(event.clone());
            Ok(())
        }

        async fn list_recent(&self, limit: usize) -> AuthResult<Vec<AuditEvent>> {
            let events = self.events.read().await;
            Ok(events.iter().rev().take(limit).cloned().collect())
        }
    }

    #[derive(Default)]
    struct BrokenStorage {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl AuditStorage for BrokenStorage {
        async fn append(&self, _event: &AuditEvent) -> AuthResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AuthError::storage("disk full"))
        }

        async fn list_recent(&self, _limit: usize) -> AuthResult<Vec<AuditEvent>> {
            Err(AuthError::storage("disk full"))
        }
    }

    /// Holds every write until permits are added to `gate`.
    struct GatedStorage {
        gate: Semaphore,
        written: AtomicUsize,
    }

    #[async_trait]
    impl AuditStorage for GatedStorage {
        async fn append(&self, _event: &AuditEvent) -> AuthResult<()> {
            self.gate
                .acquire()
                .await
                .map_err(|e| AuthError::storage(e.to_string()))?
                .forget();
            self.written.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn list_recent(&self, _limit: usize) -> AuthResult<Vec<AuditEvent>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let storage = Arc::new(GatedStorage {
            gate: Semaphore::new(0),
            written: AtomicUsize::new(0),
        });
        let sink = AuditSink::spawn(storage.clone(), 1);

        let burst = async {
            for i in 0..10 {
                sink.record(AuditEvent::builder("Login Failure", format!("attempt {i}")).build());
            }
            // Let the writer pick up the queued event and stall on storage
            tokio::task::yield_now().await;
            for i in 10..20 {
                sink.record(AuditEvent::builder("Login Failure", format!("attempt {i}")).build());
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(1), burst)
            .await
            .expect("recording must not wait on a stalled writer");

        storage.gate.add_permits(20);
        sink.flush().await;

        let written = storage.written.load(Ordering::SeqCst);
        assert!((1..=2).contains(&written), "written = {written}");
    }

    #[tokio::test]
    async fn test_events_are_written_in_order() {
        let storage = Arc::new(VecStorage::default());
        let sink = AuditSink::spawn(storage.clone(), 16);

        for i in 0..3 {
            sink.record(AuditEvent::builder("Login Failure", format!("attempt {i}")).build());
        }
        sink.flush().await;

        let recent = sink.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "attempt 2");
        assert_eq!(recent[2].message, "attempt 0");
    }

    #[tokio::test]
    async fn test_record_event_fills_fields() {
        let storage = Arc::new(VecStorage::default());
        let sink = AuditSink::spawn(storage.clone(), 4);
        let source = AuditSource::new(Some("192.0.2.1".parse().unwrap()), None);

        sink.record_event(
            "VERIFICATION_CHANGE",
            "User 7 unverified",
            Severity::Warning,
            &source,
            AuditOutcome::Success,
        );
        sink.flush().await;

        let events = storage.events.read().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(events[0].ip_address, source.ip_address);
    }

    #[tokio::test]
    async fn test_storage_failure_is_swallowed() {
        let storage = Arc::new(BrokenStorage::default());
        let sink = AuditSink::spawn(storage.clone(), 4);

        sink.record(AuditEvent::builder("Login Success", "ok").build());
        sink.record(AuditEvent::builder("Login Success", "ok again").build());
        sink.flush().await;

        assert_eq!(storage.attempts.load(Ordering::SeqCst), 2);
    }
}
