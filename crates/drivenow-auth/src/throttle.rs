//! Login throttling.
//!
//! Each account carries a failed-attempt counter and an optional lockout
//! expiry. [`ThrottleGuard`] is a pure decision function over that state:
//! it never touches storage or the audit sink itself, it returns the state
//! to persist and the event to record and leaves both to the caller.
//!
//! Policy:
//! - a login against a locked account is refused without touching the counter
//! - a correct password resets the counter and clears the lockout
//! - a wrong password increments the counter; reaching
//!   [`MAX_FAILED_ATTEMPTS`] locks the account for [`LOCKOUT_DURATION`]
//! - once a lockout has expired the stored counter is treated as zero

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::audit::{AuditEventBuilder, AuditOutcome, Severity};

/// Consecutive failures that trigger a lockout.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// How long a lockout lasts.
pub const LOCKOUT_DURATION: Duration = Duration::minutes(15);

/// Throttle fields of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleState {
    pub failed_attempts: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub lockout_until: Option<OffsetDateTime>,
}

impl ThrottleState {
    /// State after a successful login.
    #[must_use]
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Returns `true` while the lockout window is open.
    #[must_use]
    pub fn is_locked_at(&self, now: OffsetDateTime) -> bool {
        matches!(self.lockout_until, Some(until) if until > now)
    }

    /// Failure count to build on for the next attempt.
    ///
    /// A lockout that has already expired resets the count.
    #[must_use]
    pub fn effective_failures(&self, now: OffsetDateTime) -> u32 {
        match self.lockout_until {
            Some(until) if until <= now => 0,
            _ => self.failed_attempts,
        }
    }
}

/// What the guard decided about an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Credentials accepted.
    Allowed,
    /// Wrong credentials, account still open.
    Rejected,
    /// Wrong credentials, and this attempt tripped the lockout.
    LockedNow,
    /// Account was already locked; credentials were not considered.
    LockedOut,
}

impl Verdict {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

/// Result of evaluating one attempt.
#[derive(Debug, Clone)]
pub struct ThrottleDecision {
    pub verdict: Verdict,
    /// State to persist, or `None` when nothing must change.
    pub next_state: Option<ThrottleState>,
    /// The single audit event describing this attempt.
    pub event: AuditEventBuilder,
}

/// Stateless lockout policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrottleGuard;

impl ThrottleGuard {
    pub fn new() -> Self {
        Self
    }

    /// Refuses the attempt up front if the account is locked.
    ///
    /// `subject` only appears in the audit message.
    #[must_use]
    pub fn pre_check(
        &self,
        subject: &str,
        state: &ThrottleState,
        now: OffsetDateTime,
    ) -> Option<ThrottleDecision> {
        if !state.is_locked_at(now) {
            return None;
        }
        Some(ThrottleDecision {
            verdict: Verdict::LockedOut,
            next_state: None,
            event: AuditEventBuilder::new("Login Blocked", format!("User {subject} is locked out"))
                .severity(Severity::Danger)
                .outcome(AuditOutcome::Blocked),
        })
    }

    /// Decides the outcome of an attempt whose credentials were checked.
    ///
    /// Runs [`pre_check`](Self::pre_check) first, so a locked account is
    /// refused even when `credential_ok` is true.
    #[must_use]
    pub fn evaluate(
        &self,
        subject: &str,
        state: &ThrottleState,
        credential_ok: bool,
        now: OffsetDateTime,
    ) -> ThrottleDecision {
        if let Some(blocked) = self.pre_check(subject, state, now) {
            return blocked;
        }

        if credential_ok {
            return ThrottleDecision {
                verdict: Verdict::Allowed,
                next_state: Some(ThrottleState::cleared()),
                event: AuditEventBuilder::new("Login Success", format!("User {subject} logged in"))
                    .severity(Severity::Success)
                    .outcome(AuditOutcome::Success),
            };
        }

        let failed_attempts = state.effective_failures(now).saturating_add(1);
        if failed_attempts >= MAX_FAILED_ATTEMPTS {
            ThrottleDecision {
                verdict: Verdict::LockedNow,
                next_state: Some(ThrottleState {
                    failed_attempts,
                    lockout_until: Some(now + LOCKOUT_DURATION),
                }),
                event: AuditEventBuilder::new(
                    "Brute Force Alert",
                    format!("User {subject} locked after {failed_attempts} failed attempts"),
                )
                .severity(Severity::Danger)
                .outcome(AuditOutcome::Blocked),
            }
        } else {
            ThrottleDecision {
                verdict: Verdict::Rejected,
                next_state: Some(ThrottleState {
                    failed_attempts,
                    lockout_until: None,
                }),
                event: AuditEventBuilder::new("Login Failure", format!("Wrong password for {subject}"))
                    .severity(Severity::Warning)
                    .outcome(AuditOutcome::Failed),
            }
        }
    }
}
