//! PostgreSQL storage backend for DriveNow.
//!
//! Provides persistent storage for:
//!
//! - accounts, including the login throttle columns
//! - the audit log
//! - bookings
//!
//! Tables are created on startup by [`PostgresBackend::ensure_schema`].
//!
//! # Example
//!
//! ```ignore
//! use drivenow_db_postgres::PostgresBackend;
//!
//! let backend = PostgresBackend::connect("postgres://localhost/drivenow", 10).await?;
//! backend.ensure_schema().await?;
//! let accounts = backend.accounts();
//! ```

pub mod account;
pub mod audit;
pub mod booking;
pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_postgres::Postgres;

use drivenow_auth::AuthError;
use drivenow_core::CoreError;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use account::PgAccountStorage;
pub use audit::PgAuditStorage;
pub use booking::PgBookingStorage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Requested row was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row already exists (conflict).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be mapped back to a domain type.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an `InvalidData` error.
    #[must_use]
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if this is a client error (4xx equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Conflict(_))
    }

    /// Returns `true` if this is a server error (5xx equivalent).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::InvalidData(_))
    }

    /// Maps a unique-violation into `Conflict`, leaving other errors alone.
    pub(crate) fn from_insert(err: sqlx_core::Error, conflict: impl FnOnce() -> String) -> Self {
        if let sqlx_core::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::conflict(conflict());
        }
        Self::from(err)
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => AuthError::not_found(what),
            StorageError::Conflict(message) => AuthError::conflict(message),
            other => AuthError::storage(other.to_string()),
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => CoreError::not_found("Booking", what),
            StorageError::Conflict(message) => CoreError::conflict(message),
            other => CoreError::storage(other.to_string()),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// PostgreSQL Backend
// =============================================================================

/// Connection pool plus accessors for each store.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: Arc<PgPool>,
}

impl PostgresBackend {
    /// Create a backend over an existing pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Connect to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> StorageResult<Self> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(Arc::new(pool)))
    }

    /// Create tables and indexes that don't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        schema::ensure_schema(&self.pool).await
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn accounts(&self) -> PgAccountStorage {
        PgAccountStorage::new(Arc::clone(&self.pool))
    }

    #[must_use]
    pub fn audit(&self) -> PgAuditStorage {
        PgAuditStorage::new(Arc::clone(&self.pool))
    }

    #[must_use]
    pub fn bookings(&self) -> PgBookingStorage {
        PgBookingStorage::new(Arc::clone(&self.pool))
    }
}

// =============================================================================
// Tests
// =============================================================================
