//! Login throttling and auditing against the in-memory backend.

use std::sync::Arc;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use drivenow_auth::password::hash_password_with_cost;
use drivenow_auth::prelude::*;
use drivenow_auth::storage::AccountStorage;
use drivenow_core::{Clock, ManualClock, Role};
use drivenow_db_memory::{InMemoryAccountStorage, InMemoryAuditStorage};

const PASSWORD: &str = "correct-password";

struct Harness {
    accounts: Arc<InMemoryAccountStorage>,
    audit_store: Arc<InMemoryAuditStorage>,
    sink: AuditSink,
    clock: Arc<ManualClock>,
    auth: Authenticator,
    source: AuditSource,
}

impl Harness {
    fn new() -> Self {
        let accounts = Arc::new(InMemoryAccountStorage::new());
        let audit_store = Arc::new(InMemoryAuditStorage::new());
        let sink = AuditSink::spawn(audit_store.clone(), 64);
        let clock = Arc::new(ManualClock::starting_now());
        let auth = Authenticator::with_clock(accounts.clone(), Arc::new(sink.clone()), clock.clone());
        Self {
            accounts,
            audit_store,
            sink,
            clock,
            auth,
            source: AuditSource::new(Some("203.0.113.9".parse().unwrap()), Some("test-agent".into())),
        }
    }

    async fn seed(&self, email: &str, state: ThrottleState) -> Account {
        let hash = hash_password_with_cost(PASSWORD, 1024, 1).unwrap();
        let account = Account::builder(email, hash)
            .name("Test", "User")
            .role(Role::Customer)
            .verified(true)
            .throttle(state)
            .build();
        self.accounts.create(&account).await.unwrap();
        account
    }

    async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        self.auth
            .authenticate(email, password, &self.source)
            .await
            .unwrap()
    }

    async fn stored(&self, id: Uuid) -> Account {
        self.accounts.find_by_id(id).await.unwrap().unwrap()
    }

    async fn events(&self) -> Vec<AuditEvent> {
        self.sink.flush().await;
        self.audit_store.all().await
    }
}

#[tokio::test]
async fn fifth_failure_locks_the_account() {
    let h = Harness::new();
    let account = h
        .seed(
            "u1@x.com",
            ThrottleState {
                failed_attempts: 4,
                lockout_until: None,
            },
        )
        .await;
    let now = h.clock.now();

    let outcome = h.login("u1@x.com", "wrong").await;
    assert_eq!(
        outcome.failure(),
        Some(LoginFailure::InvalidCredentials { locked_now: true })
    );

    let stored = h.stored(account.id).await;
    assert_eq!(stored.failed_attempts, 5);
    assert_eq!(stored.lockout_until, Some(now + Duration::minutes(15)));

    let events = h.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "Brute Force Alert");
    assert_eq!(events[0].severity, Severity::Danger);
    assert_eq!(events[0].outcome, AuditOutcome::Blocked);
    assert_eq!(events[0].ip_address, h.source.ip_address);
    assert_eq!(events[0].user_agent.as_deref(), Some("test-agent"));
}

#[tokio::test]
async fn success_after_failures_resets_counter() {
    let h = Harness::new();
    let account = h.seed("u2@x.com", ThrottleState::default()).await;

    for expected in 1..=3 {
        let outcome = h.login("u2@x.com", "wrong").await;
        assert!(!outcome.is_success());
        assert_eq!(h.stored(account.id).await.failed_attempts, expected);
    }

    let outcome = h.login("U2@X.com", PASSWORD).await;
    match outcome {
        LoginOutcome::Success(summary) => {
            assert_eq!(summary.id, account.id);
            assert_eq!(summary.role, Role::Customer);
        }
        other => panic!("expected success, got {other:?}"),
    }
    let stored = h.stored(account.id).await;
    assert_eq!(stored.failed_attempts, 0);
    assert!(stored.lockout_until.is_none());

    let events = h.events().await;
    let actions: Vec<_> = events.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        ["Login Failure", "Login Failure", "Login Failure", "Login Success"]
    );
    assert_eq!(
        events.iter().filter(|e| e.severity == Severity::Warning).count(),
        3
    );
    assert_eq!(events[3].severity, Severity::Success);
    assert_eq!(events[3].outcome, AuditOutcome::Success);

    // Counting starts over after the success
    let outcome = h.login("u2@x.com", "wrong").await;
    assert_eq!(
        outcome.failure(),
        Some(LoginFailure::InvalidCredentials { locked_now: false })
    );
    assert_eq!(h.stored(account.id).await.failed_attempts, 1);
}

#[tokio::test]
async fn unknown_email_is_invalid_credentials() {
    let h = Harness::new();

    let outcome = h.login("ghost@x.com", "anything").await;
    assert_eq!(
        outcome.failure(),
        Some(LoginFailure::InvalidCredentials { locked_now: false })
    );
    assert!(h.accounts.is_empty());

    let events = h.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "Login Attempt");
    assert_eq!(events[0].message, "Non-existent email: ghost@x.com");
    assert_eq!(events[0].severity, Severity::Warning);
    assert_eq!(events[0].outcome, AuditOutcome::Failed);
}

#[tokio::test]
async fn sixth_attempt_is_locked_even_with_correct_password() {
    let h = Harness::new();
    let account = h.seed("u3@x.com", ThrottleState::default()).await;

    for _ in 0..5 {
        h.login("u3@x.com", "wrong").await;
    }
    let outcome = h.login("u3@x.com", PASSWORD).await;
    assert_eq!(outcome.failure(), Some(LoginFailure::AccountLocked));

    let outcome = h.login("u3@x.com", "wrong").await;
    assert_eq!(outcome.failure(), Some(LoginFailure::AccountLocked));

    let stored = h.stored(account.id).await;
    assert_eq!(stored.failed_attempts, 5);

    let events = h.events().await;
    assert_eq!(events.len(), 7);
    assert_eq!(events[4].action, "Brute Force Alert");
    assert_eq!(events[5].action, "Login Blocked");
    assert_eq!(events[5].outcome, AuditOutcome::Blocked);
    assert_eq!(events[6].action, "Login Blocked");
}

#[tokio::test]
async fn locked_attempts_do_not_touch_the_counter() {
    let h = Harness::new();
    let until = h.clock.now() + Duration::minutes(10);
    let account = h
        .seed(
            "locked@x.com",
            ThrottleState {
                failed_attempts: 5,
                lockout_until: Some(until),
            },
        )
        .await;

    for _ in 0..3 {
        h.login("locked@x.com", "wrong").await;
    }

    let stored = h.stored(account.id).await;
    assert_eq!(stored.failed_attempts, 5);
    assert_eq!(stored.lockout_until, Some(until));
}

#[tokio::test]
async fn expired_lockout_starts_over() {
    let h = Harness::new();
    let account = h.seed("u4@x.com", ThrottleState::default()).await;
    for _ in 0..5 {
        h.login("u4@x.com", "wrong").await;
    }

    h.clock.advance(Duration::minutes(15) + Duration::seconds(1));

    let outcome = h.login("u4@x.com", "wrong").await;
    assert_eq!(
        outcome.failure(),
        Some(LoginFailure::InvalidCredentials { locked_now: false })
    );
    let stored = h.stored(account.id).await;
    assert_eq!(stored.failed_attempts, 1);
    assert!(stored.lockout_until.is_none());

    assert!(h.login("u4@x.com", PASSWORD).await.is_success());
}

#[tokio::test]
async fn every_call_records_exactly_one_event() {
    let h = Harness::new();
    h.seed("u5@x.com", ThrottleState::default()).await;

    let attempts = [
        ("u5@x.com", "wrong"),
        ("nobody@x.com", "wrong"),
        ("u5@x.com", PASSWORD),
        ("u5@x.com", "wrong"),
        ("u5@x.com", "wrong"),
        ("u5@x.com", "wrong"),
        ("u5@x.com", "wrong"),
        ("u5@x.com", "wrong"),
        ("u5@x.com", PASSWORD),
    ];
    for (i, (email, password)) in attempts.iter().enumerate() {
        h.login(email, password).await;
        assert_eq!(h.events().await.len(), i + 1, "attempt {i}");
    }
}

#[tokio::test]
async fn malformed_hash_counts_as_mismatch() {
    let h = Harness::new();
    let account = Account::builder("broken@x.com", "not-a-phc-string").build();
    h.accounts.create(&account).await.unwrap();

    let outcome = h.login("broken@x.com", "whatever").await;
    assert_eq!(
        outcome.failure(),
        Some(LoginFailure::InvalidCredentials { locked_now: false })
    );
    assert_eq!(h.stored(account.id).await.failed_attempts, 1);
}

// =============================================================================
// Storage failures
// =============================================================================

/// Reads work, throttle writes fail.
struct ReadOnlyAccounts {
    inner: InMemoryAccountStorage,
}

#[async_trait]
impl AccountStorage for ReadOnlyAccounts {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        self.inner.find_by_id(id).await
    }
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        self.inner.find_by_email(email).await
    }
    async fn create(&self, account: &Account) -> AuthResult<()> {
        self.inner.create(account).await
    }
    async fn update_throttle(&self, _id: Uuid, _state: ThrottleState) -> AuthResult<()> {
        Err(AuthError::storage("connection reset"))
    }
    async fn reset_credentials(&self, id: Uuid, hash: &str) -> AuthResult<()> {
        self.inner.reset_credentials(id, hash).await
    }
    async fn set_verified(&self, id: Uuid, verified: bool) -> AuthResult<()> {
        self.inner.set_verified(id, verified).await
    }
    async fn delete(&self, id: Uuid) -> AuthResult<bool> {
        self.inner.delete(id).await
    }
    async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Account>> {
        self.inner.list(limit, offset).await
    }
    async fn list_pending_owners(&self) -> AuthResult<Vec<Account>> {
        self.inner.list_pending_owners().await
    }
}

#[tokio::test]
async fn failed_throttle_write_is_an_error_with_one_event() {
    let accounts = Arc::new(ReadOnlyAccounts {
        inner: InMemoryAccountStorage::new(),
    });
    let hash = hash_password_with_cost(PASSWORD, 1024, 1).unwrap();
    accounts
        .create(&Account::builder("u6@x.com", hash).build())
        .await
        .unwrap();

    let audit_store = Arc::new(InMemoryAuditStorage::new());
    let sink = AuditSink::spawn(audit_store.clone(), 8);
    let auth = Authenticator::new(accounts, Arc::new(sink.clone()));

    let err = auth
        .authenticate("u6@x.com", "wrong", &AuditSource::system())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Storage { .. }));

    sink.flush().await;
    let events = audit_store.all().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "Login Error");
    assert_eq!(events[0].severity, Severity::Danger);
}

#[tokio::test]
async fn lockout_expiry_is_strictly_in_the_future() {
    let h = Harness::new();
    let account = h
        .seed(
            "u7@x.com",
            ThrottleState {
                failed_attempts: 4,
                lockout_until: None,
            },
        )
        .await;
    let before: OffsetDateTime = h.clock.now();
    h.login("u7@x.com", "wrong").await;
    let stored = h.stored(account.id).await;
    assert!(stored.lockout_until.unwrap() > before);
}
