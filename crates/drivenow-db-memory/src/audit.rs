use async_trait::async_trait;
use tokio::sync::RwLock;

use drivenow_auth::{AuditEvent, AuditStorage, AuthResult};

/// Append-only audit log held in a vector.
#[derive(Debug, Default)]
pub struct InMemoryAuditStorage {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored event in append order.
    pub async fn all(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl AuditStorage for InMemoryAuditStorage {
    async fn append(&self, event: &AuditEvent) -> AuthResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> AuthResult<Vec<AuditEvent>> {
        let events = self.events.read().await;
        // Later appends win ties on timestamp.
        let mut recent: Vec<AuditEvent> = events.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        recent.truncate(limit);
        Ok(recent)
    }
}
