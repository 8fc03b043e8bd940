//! Audit log storage.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use drivenow_auth::{AuditEvent, AuditOutcome, AuditStorage, AuthResult, Severity};

use crate::{PgPool, StorageError};

type AuditRow = (
    Uuid,
    OffsetDateTime,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
);

fn event_from_row(row: AuditRow) -> AuditEvent {
    let (id, recorded_at, action, message, severity, ip_address, user_agent, outcome) = row;
    AuditEvent {
        id,
        recorded_at,
        action,
        message,
        severity: Severity::from_tag(&severity),
        // An unparseable address is dropped, the event is kept.
        ip_address: ip_address.and_then(|ip| ip.parse().ok()),
        user_agent,
        outcome: AuditOutcome::from_tag(&outcome),
    }
}

/// PostgreSQL-backed [`AuditStorage`]. Insert-only.
#[derive(Debug, Clone)]
pub struct PgAuditStorage {
    pool: Arc<PgPool>,
}

impl PgAuditStorage {
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStorage for PgAuditStorage {
    async fn append(&self, event: &AuditEvent) -> AuthResult<()> {
        query(
            r#"
            INSERT INTO audit_events (id, recorded_at, action, message, severity,
                                      ip_address, user_agent, outcome)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.recorded_at)
        .bind(&event.action)
        .bind(&event.message)
        .bind(event.severity.as_str())
        .bind(event.ip_address.map(|ip| ip.to_string()))
        .bind(&event.user_agent)
        .bind(event.outcome.as_str())
        .execute(&*self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> AuthResult<Vec<AuditEvent>> {
        let rows: Vec<AuditRow> = query_as(
            r#"
            SELECT id, recorded_at, action, message, severity, ip_address, user_agent, outcome
            FROM audit_events
            ORDER BY recorded_at DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(event_from_row).collect())
    }
}
