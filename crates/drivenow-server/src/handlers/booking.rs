use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use drivenow_auth::{AuditEvent, AuditOutcome, AuditRecorder, Severity};
use drivenow_core::{BookingStatus, CoreError, NewBooking};

use crate::audit::ClientSource;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: BookingStatus,
}

pub async fn create_booking(
    State(state): State<AppState>,
    ClientSource(source): ClientSource,
    ApiJson(body): ApiJson<NewBooking>,
) -> Result<Json<Value>, ApiError> {
    body.validate()?;

    // The customer id comes from the client session; a stale one means a
    // logged-out or deleted user.
    if state.accounts.find_by_id(body.customer_id).await?.is_none() {
        return Err(ApiError::bad_request(
            "Missing information. Please log in again.",
        ));
    }

    let booking = state.bookings.create(body).await?;
    tracing::info!(booking_id = %booking.id, car_id = booking.car_id, "Booking created");

    state.audit.record(
        AuditEvent::builder(
            "NEW_BOOKING",
            format!(
                "Booking #{} created by user ID {}",
                booking.id, booking.customer_id
            ),
        )
        .severity(Severity::Success)
        .outcome(AuditOutcome::Success)
        .source(&source)
        .build(),
    );

    Ok(Json(json!({
        "success": true,
        "message": "Booking confirmed!",
        "bookingId": booking.id,
        "booking": booking,
    })))
}

pub async fn booking_details(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let booking = state
        .bookings
        .find_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Booking", id.to_string()))?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Value>, ApiError> {
    let booking = state.bookings.update_status(id, body.status).await?;
    tracing::info!(booking_id = %id, status = %booking.status, "Booking status updated");
    Ok(Json(json!({
        "success": true,
        "message": "Status updated",
        "booking": booking,
    })))
}
