//! Account endpoints: one-time codes, registration, login and password reset.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use drivenow_auth::{LoginFailure, LoginOutcome, PasswordResetRequest, RegistrationRequest};

use crate::audit::ClientSource;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SendOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required!"));
    }

    let purged = state.codes.purge_expired();
    if purged > 0 {
        tracing::debug!(purged, "Expired verification codes removed");
    }

    state.registrar.send_code(&body.email).await?;
    Ok(Json(json!({
        "success": true,
        "message": "The verification code has been sent to your email.",
    })))
}

pub async fn register(
    State(state): State<AppState>,
    ClientSource(source): ClientSource,
    ApiJson(body): ApiJson<RegistrationRequest>,
) -> Result<Json<Value>, ApiError> {
    let account = state.registrar.register(body, &source).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Registration completed successfully!",
        "userId": account.id,
        "role": account.role,
    })))
}

pub async fn login(
    State(state): State<AppState>,
    ClientSource(source): ClientSource,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .authenticator
        .authenticate(&body.email, &body.password, &source)
        .await?;

    match outcome {
        LoginOutcome::Success(user) => Ok(Json(json!({
            "success": true,
            "redirect": user.role.home_path(),
            "user": user,
        }))),
        LoginOutcome::Failure(failure @ LoginFailure::AccountLocked) => {
            Err(ApiError::locked(failure.user_message()))
        }
        LoginOutcome::Failure(failure @ LoginFailure::InvalidCredentials { .. }) => {
            Err(ApiError::unauthorized(failure.user_message()))
        }
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    ClientSource(source): ClientSource,
    ApiJson(body): ApiJson<PasswordResetRequest>,
) -> Result<Json<Value>, ApiError> {
    state.registrar.reset_password(body, &source).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully!",
    })))
}
