//! Account storage trait.
//!
//! Defines the interface for account persistence operations.
//! Implementations are provided by the storage backend crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use drivenow_core::Role;

use crate::AuthResult;
use crate::throttle::ThrottleState;

/// Normalizes an email address for lookup and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

// =============================================================================
// Account Type
// =============================================================================

/// A marketplace account.
///
/// The password hash is never serialized; use [`AccountSummary`] for
/// anything that leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,

    /// Login identifier, always stored normalized.
    pub email: String,

    pub first_name: String,
    pub last_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Argon2id PHC string.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: Role,

    /// Owners stay unverified until an admin approves them.
    pub is_verified: bool,

    /// Consecutive failed logins since the last success.
    pub failed_attempts: u32,

    /// Logins are refused until this instant.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub lockout_until: Option<OffsetDateTime>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Account {
    /// Creates a new account builder.
    #[must_use]
    pub fn builder(email: impl AsRef<str>, password_hash: impl Into<String>) -> AccountBuilder {
        AccountBuilder::new(email, password_hash)
    }

    /// Current throttle fields as a value.
    #[must_use]
    pub fn throttle_state(&self) -> ThrottleState {
        ThrottleState {
            failed_attempts: self.failed_attempts,
            lockout_until: self.lockout_until,
        }
    }

    /// Applies a throttle state in place.
    pub fn apply_throttle(&mut self, state: ThrottleState) {
        self.failed_attempts = state.failed_attempts;
        self.lockout_until = state.lockout_until;
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary::from(self)
    }
}

/// Public view of an account, without the credential hash or throttle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            phone: account.phone.clone(),
            role: account.role,
            is_verified: account.is_verified,
            created_at: account.created_at,
        }
    }
}

// =============================================================================
// Account Builder
// =============================================================================

/// Builder for creating `Account` instances.
pub struct AccountBuilder {
    account: Account,
}

impl AccountBuilder {
    fn new(email: impl AsRef<str>, password_hash: impl Into<String>) -> Self {
        Self {
            account: Account {
                id: Uuid::new_v4(),
                email: normalize_email(email.as_ref()),
                first_name: String::new(),
                last_name: String::new(),
                phone: None,
                password_hash: password_hash.into(),
                role: Role::Customer,
                is_verified: false,
                failed_attempts: 0,
                lockout_until: None,
                created_at: OffsetDateTime::now_utc(),
            },
        }
    }

    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.account.id = id;
        self
    }

    #[must_use]
    pub fn name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.account.first_name = first.into();
        self.account.last_name = last.into();
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.account.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.account.role = role;
        self
    }

    #[must_use]
    pub fn verified(mut self, verified: bool) -> Self {
        self.account.is_verified = verified;
        self
    }

    /// Sets the initial throttle state. Mostly useful in tests.
    #[must_use]
    pub fn throttle(mut self, state: ThrottleState) -> Self {
        self.account.apply_throttle(state);
        self
    }

    #[must_use]
    pub fn created_at(mut self, at: OffsetDateTime) -> Self {
        self.account.created_at = at;
        self
    }

    #[must_use]
    pub fn build(self) -> Account {
        self.account
    }
}

// =============================================================================
// Account Storage Trait
// =============================================================================

/// Storage operations for accounts.
///
/// Lookups by email expect the caller to pass a normalized address
/// (see [`normalize_email`]); implementations may normalize again.
#[async_trait]
pub trait AccountStorage: Send + Sync {
    /// Find an account by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>>;

    /// Find an account by its email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>>;

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the email is already registered, or an error
    /// if the storage operation fails.
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Overwrite the failed-attempt counter and lockout expiry.
    ///
    /// This is a single write keyed by account id. Two concurrent attempts
    /// against the same account are last-writer-wins, so the counter may
    /// be off by one under contention.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account doesn't exist, or an error if the
    /// storage operation fails.
    async fn update_throttle(&self, id: Uuid, state: ThrottleState) -> AuthResult<()>;

    /// Replace the password hash and clear the throttle state.
    ///
    /// Both changes land in one write, so a failure never leaves a new
    /// password behind an old lockout.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account doesn't exist, or an error if the
    /// storage operation fails.
    async fn reset_credentials(&self, id: Uuid, password_hash: &str) -> AuthResult<()>;

    /// Set the verification flag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account doesn't exist, or an error if the
    /// storage operation fails.
    async fn set_verified(&self, id: Uuid, verified: bool) -> AuthResult<()>;

    /// Delete an account.
    ///
    /// Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete(&self, id: Uuid) -> AuthResult<bool>;

    /// List accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Account>>;

    /// List owners still waiting for verification, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_pending_owners(&self) -> AuthResult<Vec<Account>>;
}
