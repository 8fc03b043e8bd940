//! Account storage.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;
use uuid::Uuid;

use drivenow_auth::storage::{Account, AccountStorage, normalize_email};
use drivenow_auth::{AuthResult, ThrottleState};
use drivenow_core::Role;

use crate::{PgPool, StorageError, StorageResult};

const ACCOUNT_COLUMNS: &str = "id, email, first_name, last_name, phone, password_hash, role, \
     is_verified, failed_attempts, lockout_until, created_at";

fn account_from_row(row: &PgRow) -> StorageResult<Account> {
    let role: String = row.try_get("role")?;
    let role: Role = role
        .parse()
        .map_err(|_| StorageError::invalid_data(format!("unknown role '{role}'")))?;
    let failed_attempts: i32 = row.try_get("failed_attempts")?;

    Ok(Account {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        password_hash: row.try_get("password_hash")?,
        role,
        is_verified: row.try_get("is_verified")?,
        failed_attempts: u32::try_from(failed_attempts).unwrap_or(0),
        lockout_until: row.try_get("lockout_until")?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL-backed [`AccountStorage`].
#[derive(Debug, Clone)]
pub struct PgAccountStorage {
    pool: Arc<PgPool>,
}

impl PgAccountStorage {
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Fails with `NotFound` when an UPDATE keyed by id matched nothing.
    fn ensure_updated(rows: u64, id: Uuid) -> StorageResult<()> {
        if rows == 0 {
            return Err(StorageError::not_found(format!("account {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStorage for PgAccountStorage {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = query(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.as_ref().map(account_from_row).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let row = query(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&*self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.as_ref().map(account_from_row).transpose()?)
    }

    async fn create(&self, account: &Account) -> AuthResult<()> {
        let email = normalize_email(&account.email);
        query(
            r#"
            INSERT INTO accounts (id, email, first_name, last_name, phone, password_hash,
                                  role, is_verified, failed_attempts, lockout_until, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(account.id)
        .bind(&email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_verified)
        .bind(i32::try_from(account.failed_attempts).unwrap_or(i32::MAX))
        .bind(account.lockout_until)
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            StorageError::from_insert(e, || format!("an account with email {email} already exists"))
        })?;
        Ok(())
    }

    async fn update_throttle(&self, id: Uuid, state: ThrottleState) -> AuthResult<()> {
        let result = query(
            "UPDATE accounts SET failed_attempts = $2, lockout_until = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(i32::try_from(state.failed_attempts).unwrap_or(i32::MAX))
        .bind(state.lockout_until)
        .execute(&*self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(Self::ensure_updated(result.rows_affected(), id)?)
    }

    async fn reset_credentials(&self, id: Uuid, password_hash: &str) -> AuthResult<()> {
        let result = query(
            "UPDATE accounts SET password_hash = $2, failed_attempts = 0, lockout_until = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&*self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(Self::ensure_updated(result.rows_affected(), id)?)
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> AuthResult<()> {
        let result = query("UPDATE accounts SET is_verified = $2 WHERE id = $1")
            .bind(id)
            .bind(verified)
            .execute(&*self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Self::ensure_updated(result.rows_affected(), id)?)
    }

    async fn delete(&self, id: Uuid) -> AuthResult<bool> {
        let result = query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, id LIMIT $1 OFFSET $2"
        );
        let rows = query(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&*self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows
            .iter()
            .map(account_from_row)
            .collect::<StorageResult<Vec<_>>>()?)
    }

    async fn list_pending_owners(&self) -> AuthResult<Vec<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE role = 'owner' AND is_verified = FALSE ORDER BY created_at, id"
        );
        let rows = query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows
            .iter()
            .map(account_from_row)
            .collect::<StorageResult<Vec<_>>>()?)
    }
}
