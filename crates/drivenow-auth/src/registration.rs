//! Code-gated registration and password reset.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use drivenow_core::Role;

use crate::audit::{AuditEvent, AuditOutcome, AuditRecorder, AuditSource, Severity};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::otp::{CodeDelivery, OtpError, OtpStore};
use crate::password::hash_password;
use crate::storage::{Account, AccountStorage, AccountSummary, normalize_email};
use crate::AuthResult;

/// Fields submitted on the sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    #[serde(alias = "otp")]
    pub code: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Customer
}

/// Fields submitted on the password reset form.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
    #[serde(alias = "otp")]
    pub code: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

/// Issues verification codes and handles the flows that consume them.
pub struct Registrar {
    accounts: Arc<dyn AccountStorage>,
    audit: Arc<dyn AuditRecorder>,
    codes: Arc<OtpStore>,
    delivery: Arc<dyn CodeDelivery>,
    min_password_length: usize,
}

impl Registrar {
    pub fn new(
        accounts: Arc<dyn AccountStorage>,
        audit: Arc<dyn AuditRecorder>,
        codes: Arc<OtpStore>,
        delivery: Arc<dyn CodeDelivery>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            accounts,
            audit,
            codes,
            delivery,
            min_password_length: config.min_password_length,
        }
    }

    /// Issues a code for `email` and sends it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a malformed email and `Delivery` if the
    /// code could not be sent. A code that failed to send is withdrawn.
    pub async fn send_code(&self, email: &str) -> AuthResult<()> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let code = self.codes.issue(&email);
        if let Err(e) = self.delivery.deliver(&email, &code).await {
            warn!(email = %email, error = %e, "Verification code delivery failed");
            self.codes.invalidate(&email);
            return Err(e);
        }
        Ok(())
    }

    /// Creates an account after checking the emailed code.
    ///
    /// Owners start unverified; customers are verified immediately.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for missing fields or a short password
    /// - `Forbidden` when asking for the admin role
    /// - `InvalidCode` for a wrong or expired code
    /// - `Conflict` if the email is already registered
    /// - `Storage` if the account could not be saved
    pub async fn register(
        &self,
        request: RegistrationRequest,
        source: &AuditSource,
    ) -> AuthResult<AccountSummary> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(AuthError::invalid_request("first and last name are required"));
        }
        self.validate_password(&request.password)?;
        if !request.role.can_self_register() {
            return Err(AuthError::forbidden(format!(
                "the {} role cannot be self-registered",
                request.role
            )));
        }

        self.codes.check(&email, &request.code).map_err(code_error)?;

        let password_hash = hash_blocking(request.password).await?;

        let mut builder = Account::builder(&email, password_hash)
            .name(request.first_name.trim(), request.last_name.trim())
            .role(request.role)
            .verified(!request.role.requires_verification());
        if let Some(phone) = request.phone.filter(|p| !p.trim().is_empty()) {
            builder = builder.phone(phone.trim());
        }
        let account = builder.build();

        self.accounts.create(&account).await?;
        self.codes.invalidate(&email);

        info!(account_id = %account.id, role = %account.role, "Account registered");
        self.audit.record(
            AuditEvent::builder(
                "Registration",
                format!("New {} account registered: {email}", account.role),
            )
            .severity(Severity::Info)
            .outcome(AuditOutcome::Success)
            .source(source)
            .build(),
        );

        Ok(account.summary())
    }

    /// Replaces the password after checking the emailed code.
    ///
    /// Also lifts any lockout, since the person just proved control of the
    /// mailbox.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a short password
    /// - `InvalidCode` for a wrong or expired code, or an unknown email
    /// - `Storage` if the account could not be updated
    pub async fn reset_password(
        &self,
        request: PasswordResetRequest,
        source: &AuditSource,
    ) -> AuthResult<()> {
        let email = normalize_email(&request.email);
        self.validate_password(&request.new_password)?;

        self.codes.check(&email, &request.code).map_err(code_error)?;

        let Some(account) = self.accounts.find_by_email(&email).await? else {
            self.codes.invalidate(&email);
            return Err(code_error(OtpError::Invalid));
        };

        let password_hash = hash_blocking(request.new_password).await?;
        self.accounts
            .reset_credentials(account.id, &password_hash)
            .await?;
        self.codes.invalidate(&email);

        info!(account_id = %account.id, "Password reset");
        self.audit.record(
            AuditEvent::builder("Password Reset", format!("Password reset for {email}"))
                .severity(Severity::Info)
                .outcome(AuditOutcome::Success)
                .source(source)
                .build(),
        );
        Ok(())
    }

    fn validate_password(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::invalid_request(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("pending_codes", &self.codes.len())
            .field("min_password_length", &self.min_password_length)
            .finish_non_exhaustive()
    }
}

fn validate_email(email: &str) -> AuthResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AuthError::invalid_request("a valid email is required")),
    }
}

fn code_error(err: OtpError) -> AuthError {
    AuthError::invalid_code(err.to_string())
}

async fn hash_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::internal(format!("password hashing did not complete: {e}")))?
        .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))
}
