//! Storage traits for accounts and audit events.
//!
//! # Implementations
//!
//! - `drivenow-db-memory` - in-process backend for tests and local runs
//! - `drivenow-db-postgres` - PostgreSQL backend

pub mod account;
pub mod audit;

pub use account::{Account, AccountBuilder, AccountStorage, AccountSummary, normalize_email};
pub use audit::AuditStorage;
