//! Startup seeding.

use tracing::info;

use drivenow_auth::password::hash_password;
use drivenow_auth::{Account, AccountStorage, AuthError, AuthResult, normalize_email};
use drivenow_core::Role;

use crate::config::AdminUserConfig;

/// Creates the configured admin account unless the email is already taken.
///
/// Returns `true` if an account was created. An existing account is left
/// untouched, whatever its role.
pub async fn ensure_admin_user(
    accounts: &dyn AccountStorage,
    admin: &AdminUserConfig,
) -> AuthResult<bool> {
    let email = normalize_email(&admin.email);
    if accounts.find_by_email(&email).await?.is_some() {
        info!(email = %email, "Bootstrap admin already exists, skipping");
        return Ok(false);
    }

    let password = admin.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::internal(format!("password hashing did not complete: {e}")))?
        .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))?;

    let account = Account::builder(&email, password_hash)
        .name(admin.first_name.as_str(), admin.last_name.as_str())
        .role(Role::Admin)
        .verified(true)
        .build();
    accounts.create(&account).await?;

    info!(account_id = %account.id, email = %email, "Bootstrap admin created");
    Ok(true)
}
