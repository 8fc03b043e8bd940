//! Login.
//!
//! [`Authenticator::authenticate`] ties together account lookup, the
//! throttle guard, password verification and the audit trail. Every call
//! records exactly one audit event, whatever the outcome.

use std::sync::Arc;

use drivenow_core::{Clock, SystemClock};
use tracing::{debug, warn};

use crate::audit::{AuditEventBuilder, AuditOutcome, AuditRecorder, AuditSource, Severity};
use crate::error::AuthError;
use crate::password::verify_password;
use crate::storage::{Account, AccountStorage, AccountSummary, normalize_email};
use crate::throttle::{ThrottleGuard, Verdict};
use crate::AuthResult;

/// Message shown for a wrong email or password.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid Email or incorrect Password";

/// Message shown when an attempt hits an active lockout.
pub const ACCOUNT_LOCKED_MESSAGE: &str = "Account temporarily locked. Try again later.";

/// Message shown when an attempt triggers a lockout.
pub const LOCKED_NOW_MESSAGE: &str = "Too many attempts. Account locked for 15 mins.";

/// Why a login was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// Unknown email or wrong password. `locked_now` is set when this very
    /// attempt pushed the account into lockout.
    InvalidCredentials { locked_now: bool },
    /// The account was already locked; the password was not checked.
    AccountLocked,
}

impl LoginFailure {
    /// Text suitable for showing to the person logging in.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            LoginFailure::InvalidCredentials { locked_now: false } => INVALID_CREDENTIALS_MESSAGE,
            LoginFailure::InvalidCredentials { locked_now: true } => LOCKED_NOW_MESSAGE,
            LoginFailure::AccountLocked => ACCOUNT_LOCKED_MESSAGE,
        }
    }
}

/// Result of a login attempt that reached a decision.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Success(AccountSummary),
    Failure(LoginFailure),
}

impl LoginOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success(_))
    }

    #[must_use]
    pub fn failure(&self) -> Option<LoginFailure> {
        match self {
            LoginOutcome::Success(_) => None,
            LoginOutcome::Failure(f) => Some(*f),
        }
    }
}

/// Credential checker with lockout and auditing.
pub struct Authenticator {
    accounts: Arc<dyn AccountStorage>,
    audit: Arc<dyn AuditRecorder>,
    clock: Arc<dyn Clock>,
    guard: ThrottleGuard,
}

impl Authenticator {
    pub fn new(accounts: Arc<dyn AccountStorage>, audit: Arc<dyn AuditRecorder>) -> Self {
        Self::with_clock(accounts, audit, Arc::new(SystemClock))
    }

    pub fn with_clock(
        accounts: Arc<dyn AccountStorage>,
        audit: Arc<dyn AuditRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            audit,
            clock,
            guard: ThrottleGuard::new(),
        }
    }

    /// Checks an email/password pair.
    ///
    /// Rejections come back as `Ok(LoginOutcome::Failure(_))`. An `Err` means
    /// the attempt could not be decided, and no throttle state was changed
    /// unless the failing step was the final write itself.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the account could not be read or its
    /// throttle state could not be saved, and `AuthError::Internal` if the
    /// password check could not run.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        source: &AuditSource,
    ) -> AuthResult<LoginOutcome> {
        let email = normalize_email(email);

        let account = match self.accounts.find_by_email(&email).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                self.record(
                    AuditEventBuilder::new("Login Attempt", format!("Non-existent email: {email}"))
                        .severity(Severity::Warning)
                        .outcome(AuditOutcome::Failed),
                    source,
                );
                return Ok(LoginOutcome::Failure(LoginFailure::InvalidCredentials {
                    locked_now: false,
                }));
            }
            Err(e) => return Err(self.record_error(&email, source, e)),
        };

        let state = account.throttle_state();
        let now = self.clock.now();

        if let Some(blocked) = self.guard.pre_check(&email, &state, now) {
            debug!(account_id = %account.id, "Login refused, account locked");
            self.record(blocked.event, source);
            return Ok(LoginOutcome::Failure(LoginFailure::AccountLocked));
        }

        let credential_ok = match self.check_password(password, &account).await {
            Ok(ok) => ok,
            Err(e) => return Err(self.record_error(&email, source, e)),
        };

        let decision = self.guard.evaluate(&email, &state, credential_ok, now);

        if let Some(next) = decision.next_state
            && let Err(e) = self.accounts.update_throttle(account.id, next).await
        {
            return Err(self.record_error(&email, source, e));
        }

        self.record(decision.event, source);

        let outcome = match decision.verdict {
            Verdict::Allowed => LoginOutcome::Success(account.summary()),
            Verdict::Rejected => {
                LoginOutcome::Failure(LoginFailure::InvalidCredentials { locked_now: false })
            }
            Verdict::LockedNow => {
                warn!(account_id = %account.id, "Account locked after repeated failures");
                LoginOutcome::Failure(LoginFailure::InvalidCredentials { locked_now: true })
            }
            Verdict::LockedOut => LoginOutcome::Failure(LoginFailure::AccountLocked),
        };
        Ok(outcome)
    }

    /// Runs Argon2 verification off the async executor.
    ///
    /// A stored hash that can't be parsed counts as a mismatch.
    async fn check_password(&self, password: &str, account: &Account) -> AuthResult<bool> {
        let password = password.to_owned();
        let hash = account.password_hash.clone();
        let account_id = account.id;

        let result = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::internal(format!("password check did not complete: {e}")))?;

        match result {
            Ok(ok) => Ok(ok),
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Stored password hash is malformed");
                Ok(false)
            }
        }
    }

    fn record(&self, event: AuditEventBuilder, source: &AuditSource) {
        self.audit
            .record(event.source(source).build_at(self.clock.now()));
    }

    /// Records the single event for an attempt that failed on infrastructure
    /// and hands the error back.
    fn record_error(&self, email: &str, source: &AuditSource, err: AuthError) -> AuthError {
        tracing::error!(error = %err, email = %email, "Login could not be completed");
        self.record(
            AuditEventBuilder::new("Login Error", format!("Login for {email} could not be completed"))
                .severity(Severity::Danger)
                .outcome(AuditOutcome::Failed),
            source,
        );
        err
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            LoginFailure::InvalidCredentials { locked_now: false }.user_message(),
            "invalid Email or incorrect Password"
        );
        assert_eq!(
            LoginFailure::InvalidCredentials { locked_now: true }.user_message(),
            "Too many attempts. Account locked for 15 mins."
        );
        assert_eq!(
            LoginFailure::AccountLocked.user_message(),
            "Account temporarily locked. Try again later."
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = LoginOutcome::Failure(LoginFailure::AccountLocked);
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure(), Some(LoginFailure::AccountLocked));
    }
}
