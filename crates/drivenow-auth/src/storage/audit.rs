//! Audit event storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::audit::AuditEvent;

/// Append-only storage for audit events.
///
/// Events are never updated or deleted once appended.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Append an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn append(&self, event: &AuditEvent) -> AuthResult<()>;

    /// Return at most `limit` events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_recent(&self, limit: usize) -> AuthResult<Vec<AuditEvent>>;
}
