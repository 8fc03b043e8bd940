//! Account moderation: listing users, verifying accounts and approving owners.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use drivenow_auth::{AccountSummary, AuditEvent, AuditOutcome, AuditRecorder, Severity};
use drivenow_core::Role;

use crate::audit::ClientSource;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::server::AppState;

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationAction {
    Verify,
    Unverify,
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    #[serde(alias = "userId")]
    pub user_id: Uuid,
    pub action: VerificationAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    #[serde(alias = "userId")]
    pub user_id: Uuid,
    pub action: ApprovalAction,
}

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UsersQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let users: Vec<AccountSummary> = state
        .accounts
        .list(limit, offset)
        .await?
        .iter()
        .map(AccountSummary::from)
        .collect();
    Ok(Json(json!({ "success": true, "users": users })))
}

pub async fn pending_approvals(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let pending: Vec<AccountSummary> = state
        .accounts
        .list_pending_owners()
        .await?
        .iter()
        .map(AccountSummary::from)
        .collect();
    Ok(Json(json!({ "success": true, "pending": pending })))
}

pub async fn manage_verification(
    State(state): State<AppState>,
    ClientSource(source): ClientSource,
    ApiJson(body): ApiJson<VerificationRequest>,
) -> Result<Json<Value>, ApiError> {
    let verify = body.action == VerificationAction::Verify;
    state.accounts.set_verified(body.user_id, verify).await?;

    let (label, severity) = if verify {
        ("verify", Severity::Success)
    } else {
        ("unverify", Severity::Warning)
    };
    tracing::info!(account_id = %body.user_id, action = label, "Verification changed");
    state.audit.record(
        AuditEvent::builder(
            "VERIFICATION_CHANGE",
            format!("User ID {} status set to {label}", body.user_id),
        )
        .severity(severity)
        .outcome(AuditOutcome::Success)
        .source(&source)
        .build(),
    );

    let message = if verify {
        "Account verified."
    } else {
        "Account unverified."
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

/// Approving marks an owner verified. Rejecting deletes the account.
pub async fn approve_owner(
    State(state): State<AppState>,
    ClientSource(source): ClientSource,
    ApiJson(body): ApiJson<ApprovalRequest>,
) -> Result<Json<Value>, ApiError> {
    let account = state
        .accounts
        .find_by_id(body.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Owner not found"))?;
    if account.role != Role::Owner {
        return Err(ApiError::bad_request(
            "Only owner accounts can be approved or rejected",
        ));
    }

    let event = match body.action {
        ApprovalAction::Approve => {
            state.accounts.set_verified(account.id, true).await?;
            AuditEvent::builder("OWNER_APPROVED", format!("Owner ID {} approved", account.id))
                .severity(Severity::Success)
        }
        ApprovalAction::Reject => {
            if !state.accounts.delete(account.id).await? {
                return Err(ApiError::not_found("Owner not found"));
            }
            AuditEvent::builder("OWNER_REJECTED", format!("Owner ID {} deleted", account.id))
                .severity(Severity::Danger)
        }
    };
    tracing::info!(account_id = %account.id, action = ?body.action, "Owner moderated");
    state.audit.record(
        event
            .outcome(AuditOutcome::Success)
            .source(&source)
            .build(),
    );

    let message = match body.action {
        ApprovalAction::Approve => "Owner approved.",
        ApprovalAction::Reject => "Owner rejected.",
    };
    Ok(Json(json!({ "success": true, "message": message })))
}
