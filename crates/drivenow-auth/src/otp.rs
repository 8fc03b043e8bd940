//! One-time verification codes.
//!
//! Registration and password reset are gated on a 6-digit code sent to the
//! account's email. Codes live in process memory only, keyed by normalized
//! email, and expire after the configured TTL. Expiry is checked on every
//! read; [`OtpStore::purge_expired`] sweeps entries nobody came back for.
//! A code is dropped after [`MAX_CODE_ATTEMPTS`] wrong guesses, so it can't
//! be brute-forced within its lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use subtle::ConstantTimeEq;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use drivenow_core::{Clock, SystemClock};

use crate::AuthResult;
use crate::storage::normalize_email;
use crate::throttle::MAX_FAILED_ATTEMPTS;

const DEFAULT_TTL: Duration = Duration::minutes(5);

/// Wrong guesses a single code tolerates before it is discarded.
pub const MAX_CODE_ATTEMPTS: u32 = MAX_FAILED_ATTEMPTS;

/// Why a code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    /// No code was issued for this email, or the code doesn't match.
    #[error("Invalid verification code or it has expired!")]
    Invalid,
    /// The code matched but its lifetime is over.
    #[error("The code has expired. Please request a new one.")]
    Expired,
}

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: OffsetDateTime,
    failed_checks: u32,
}

/// In-memory store of outstanding codes.
#[derive(Debug)]
pub struct OtpStore {
    entries: DashMap<String, OtpEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl OtpStore {
    /// Creates a store whose codes live for `ttl`.
    pub fn new(ttl: std::time::Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::try_from(ttl).unwrap_or(DEFAULT_TTL),
            clock,
        }
    }

    /// Issues a fresh code for `email`, replacing any previous one.
    pub fn issue(&self, email: &str) -> String {
        let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(
            normalize_email(email),
            OtpEntry {
                code: code.clone(),
                expires_at,
                failed_checks: 0,
            },
        );
        code
    }

    /// Checks a code without using it up.
    ///
    /// A wrong guess counts against the entry; the entry is removed once it
    /// has seen [`MAX_CODE_ATTEMPTS`] of them, or when it has expired.
    pub fn check(&self, email: &str, code: &str) -> Result<(), OtpError> {
        let key = normalize_email(email);
        let now = self.clock.now();

        let Some(mut entry) = self.entries.get_mut(&key) else {
            return Err(OtpError::Invalid);
        };

        let matches: bool = entry.code.as_bytes().ct_eq(code.trim().as_bytes()).into();
        if !matches {
            entry.failed_checks = entry.failed_checks.saturating_add(1);
            let exhausted = entry.failed_checks >= MAX_CODE_ATTEMPTS;
            drop(entry);
            if exhausted {
                self.entries.remove(&key);
                warn!(email = %key, "Verification code discarded after repeated wrong guesses");
            }
            return Err(OtpError::Invalid);
        }

        let expired = entry.expires_at <= now;
        drop(entry);
        if expired {
            self.entries.remove(&key);
            return Err(OtpError::Expired);
        }
        Ok(())
    }

    /// Checks a code and removes it on success.
    pub fn verify(&self, email: &str, code: &str) -> Result<(), OtpError> {
        self.check(email, code)?;
        self.invalidate(email);
        Ok(())
    }

    /// Drops any code outstanding for `email`.
    pub fn invalidate(&self, email: &str) {
        self.entries.remove(&normalize_email(email));
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "Purged expired verification codes");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// Sends a verification code to its recipient.
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    /// Deliver `code` to `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Delivery` if the code could not be sent.
    async fn deliver(&self, email: &str, code: &str) -> AuthResult<()>;
}

/// Delivery that only writes the code to the log.
///
/// Suitable for local runs; there is no outbound mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

#[async_trait]
impl CodeDelivery for LogDelivery {
    async fn deliver(&self, email: &str, code: &str) -> AuthResult<()> {
        info!(email = %email, "Verification code dispatched");
        debug!(email = %email, code = %code, "Verification code");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivenow_core::ManualClock;
    use time::macros::datetime;

    fn store() -> (OtpStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(datetime!(2025-01-01 10:00 UTC)));
        let store = OtpStore::with_clock(std::time::Duration::from_secs(300), clock.clone());
        (store, clock)
    }

    #[test]
    fn test_issue_produces_six_digits() {
        let (store, _) = store();
        let code = store.issue("a@b.c");
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_verify_is_single_use() {
        let (store, _) = store();
        let code = store.issue("A@B.c");
        assert_eq!(store.verify("a@b.c", &code), Ok(()));
        assert_eq!(store.verify("a@b.c", &code), Err(OtpError::Invalid));
    }

    #[test]
    fn test_check_does_not_consume() {
        let (store, _) = store();
        let code = store.issue("a@b.c");
        assert_eq!(store.check("a@b.c", &code), Ok(()));
        assert_eq!(store.check("a@b.c", &code), Ok(()));
    }

    #[test]
    fn test_wrong_code_is_invalid() {
        let (store, _) = store();
        let code = store.issue("a@b.c");
        let wrong = if code == "123456" { "654321" } else { "123456" };
        assert_eq!(store.verify("a@b.c", wrong), Err(OtpError::Invalid));
        assert_eq!(store.verify("nobody@b.c", &code), Err(OtpError::Invalid));
    }

    fn wrong_code(code: &str) -> &'static str {
        if code == "123456" { "654321" } else { "123456" }
    }

    #[test]
    fn test_code_survives_fewer_than_max_wrong_guesses() {
        let (store, _) = store();
        let code = store.issue("a@b.c");
        for _ in 1..MAX_CODE_ATTEMPTS {
            assert_eq!(store.check("a@b.c", wrong_code(&code)), Err(OtpError::Invalid));
        }
        assert_eq!(store.check("a@b.c", &code), Ok(()));
    }

    #[test]
    fn test_code_is_discarded_after_max_wrong_guesses() {
        let (store, _) = store();
        let code = store.issue("a@b.c");
        for _ in 0..MAX_CODE_ATTEMPTS {
            assert_eq!(store.check("a@b.c", wrong_code(&code)), Err(OtpError::Invalid));
        }
        assert!(store.is_empty());
        assert_eq!(store.check("a@b.c", &code), Err(OtpError::Invalid));
    }

    #[test]
    fn test_reissue_resets_wrong_guess_count() {
        let (store, _) = store();
        let first = store.issue("a@b.c");
        for _ in 1..MAX_CODE_ATTEMPTS {
            let _ = store.check("a@b.c", wrong_code(&first));
        }
        let code = store.issue("a@b.c");
        assert_eq!(store.check("a@b.c", wrong_code(&code)), Err(OtpError::Invalid));
        assert_eq!(store.check("a@b.c", &code), Ok(()));
    }

    #[test]
    fn test_expired_code_is_rejected_and_purged_on_read() {
        let (store, clock) = store();
        let code = store.issue("a@b.c");
        clock.advance(Duration::minutes(5));

        assert_eq!(store.verify("a@b.c", &code), Err(OtpError::Expired));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reissue_replaces_previous_code() {
        let (store, _) = store();
        let first = store.issue("a@b.c");
        let mut second = store.issue("a@b.c");
        while second == first {
            second = store.issue("a@b.c");
        }
        assert_eq!(store.check("a@b.c", &first), Err(OtpError::Invalid));
        assert_eq!(store.check("a@b.c", &second), Ok(()));
    }

    #[test]
    fn test_purge_expired() {
        let (store, clock) = store();
        store.issue("old@b.c");
        clock.advance(Duration::minutes(4));
        store.issue("new@b.c");
        clock.advance(Duration::minutes(2));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_log_delivery_succeeds() {
        assert!(LogDelivery.deliver("a@b.c", "123456").await.is_ok());
    }
}
