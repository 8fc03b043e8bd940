use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use drivenow_auth::storage::{Account, AccountStorage, normalize_email};
use drivenow_auth::{AuthError, AuthResult, ThrottleState};
use drivenow_core::Role;

/// Account store keyed by id, with a unique index on email.
#[derive(Debug, Default)]
pub struct InMemoryAccountStorage {
    accounts: DashMap<Uuid, Account>,
    emails: DashMap<String, Uuid>,
}

impl InMemoryAccountStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut Account)) -> AuthResult<()> {
        match self.accounts.get_mut(&id) {
            Some(mut account) => {
                f(account.value_mut());
                Ok(())
            }
            None => Err(AuthError::not_found(format!("account {id}"))),
        }
    }

    fn sorted(&self, filter: impl Fn(&Account) -> bool) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        accounts
    }
}

#[async_trait]
impl AccountStorage for InMemoryAccountStorage {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        let Some(id) = self.emails.get(&normalize_email(email)).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn create(&self, account: &Account) -> AuthResult<()> {
        let email = normalize_email(&account.email);
        match self.emails.entry(email.clone()) {
            Entry::Occupied(_) => Err(AuthError::conflict(format!(
                "an account with email {email} already exists"
            ))),
            Entry::Vacant(slot) => {
                let mut stored = account.clone();
                stored.email = email;
                slot.insert(stored.id);
                self.accounts.insert(stored.id, stored);
                Ok(())
            }
        }
    }

    async fn update_throttle(&self, id: Uuid, state: ThrottleState) -> AuthResult<()> {
        self.modify(id, |account| account.apply_throttle(state))
    }

    async fn reset_credentials(&self, id: Uuid, password_hash: &str) -> AuthResult<()> {
        self.modify(id, |account| {
            account.password_hash = password_hash.to_string();
            account.apply_throttle(ThrottleState::cleared());
        })
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> AuthResult<()> {
        self.modify(id, |account| account.is_verified = verified)
    }

    async fn delete(&self, id: Uuid) -> AuthResult<bool> {
        match self.accounts.remove(&id) {
            Some((_, account)) => {
                self.emails.remove(&account.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Account>> {
        Ok(self
            .sorted(|_| true)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn list_pending_owners(&self) -> AuthResult<Vec<Account>> {
        Ok(self.sorted(|a| a.role == Role::Owner && !a.is_verified))
    }
}
