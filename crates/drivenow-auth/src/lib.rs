//! # drivenow-auth
//!
//! Accounts, login throttling and the security audit trail for DriveNow.
//!
//! ## Modules
//!
//! - [`service`] - login: lookup, lockout check, password check, audit
//! - [`throttle`] - the lockout policy as a pure decision function
//! - [`audit`] - audit events and the queued sink that persists them
//! - [`registration`] - sign-up and password reset gated by emailed codes
//! - [`otp`] - one-time code store and delivery trait
//! - [`password`] - Argon2id hashing
//! - [`storage`] - storage traits implemented by the backend crates
//! - [`config`] - tunables for the above

pub mod audit;
pub mod config;
pub mod error;
pub mod otp;
pub mod password;
pub mod registration;
pub mod service;
pub mod storage;
pub mod throttle;

pub use audit::{AuditEvent, AuditEventBuilder, AuditOutcome, AuditRecorder, AuditSink, AuditSource, Severity};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use otp::{CodeDelivery, LogDelivery, MAX_CODE_ATTEMPTS, OtpError, OtpStore};
pub use registration::{PasswordResetRequest, Registrar, RegistrationRequest};
pub use service::{Authenticator, LoginFailure, LoginOutcome};
pub use storage::{Account, AccountStorage, AccountSummary, AuditStorage, normalize_email};
pub use throttle::{LOCKOUT_DURATION, MAX_FAILED_ATTEMPTS, ThrottleDecision, ThrottleGuard, ThrottleState, Verdict};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use drivenow_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::audit::{AuditEvent, AuditOutcome, AuditRecorder, AuditSink, AuditSource, Severity};
    pub use crate::config::AuthConfig;
    pub use crate::error::AuthError;
    pub use crate::service::{Authenticator, LoginFailure, LoginOutcome};
    pub use crate::storage::{Account, AccountStorage, AccountSummary, AuditStorage};
    pub use crate::throttle::ThrottleState;
}
