//! Table definitions.

use sqlx_core::query::query;

use crate::{PgPool, StorageResult};

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id              UUID PRIMARY KEY,
        email           TEXT NOT NULL UNIQUE,
        first_name      TEXT NOT NULL,
        last_name       TEXT NOT NULL,
        phone           TEXT,
        password_hash   TEXT NOT NULL,
        role            TEXT NOT NULL CHECK (role IN ('admin', 'owner', 'customer')),
        is_verified     BOOLEAN NOT NULL DEFAULT FALSE,
        failed_attempts INTEGER NOT NULL DEFAULT 0 CHECK (failed_attempts >= 0),
        lockout_until   TIMESTAMPTZ,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_events (
        id          UUID PRIMARY KEY,
        recorded_at TIMESTAMPTZ NOT NULL,
        action      TEXT NOT NULL,
        message     TEXT NOT NULL,
        severity    TEXT NOT NULL,
        ip_address  TEXT,
        user_agent  TEXT,
        outcome     TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS audit_events_recorded_at_idx
        ON audit_events (recorded_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id                       UUID PRIMARY KEY,
        car_id                   BIGINT NOT NULL,
        customer_id              UUID NOT NULL,
        start_date               DATE NOT NULL,
        end_date                 DATE NOT NULL,
        location                 TEXT,
        total_price              DOUBLE PRECISION NOT NULL,
        email                    TEXT NOT NULL,
        phone                    TEXT NOT NULL,
        national_id              TEXT NOT NULL,
        driver_license           TEXT,
        license_expiry           DATE,
        license_country          TEXT,
        terms_accepted           BOOLEAN NOT NULL DEFAULT FALSE,
        insurance_confirmed      BOOLEAN NOT NULL DEFAULT FALSE,
        driving_record_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
        payment_method           TEXT NOT NULL,
        status                   TEXT NOT NULL DEFAULT 'confirmed',
        created_at               TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Runs every `CREATE ... IF NOT EXISTS` statement in order.
pub async fn ensure_schema(pool: &PgPool) -> StorageResult<()> {
    for statement in STATEMENTS {
        query(statement).execute(pool).await?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "Database schema ensured");
    Ok(())
}
