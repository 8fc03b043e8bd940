//! Rental bookings.
//!
//! A booking ties a customer account to a car for a date range. Bookings are
//! plain records; the only behaviour here is input validation and the
//! storage interface implemented by the backend crates.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::{CoreError, Result};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::InvalidBookingStatus(other.to_string())),
        }
    }
}

/// Input for a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub car_id: i64,
    pub customer_id: Uuid,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    #[serde(default)]
    pub location: Option<String>,
    pub total_price: f64,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    #[serde(default)]
    pub driver_license: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub license_expiry: Option<Date>,
    #[serde(default)]
    pub license_country: Option<String>,
    #[serde(default)]
    pub terms_accepted: bool,
    #[serde(default)]
    pub insurance_confirmed: bool,
    #[serde(default)]
    pub driving_record_confirmed: bool,
    pub payment_method: String,
}

impl NewBooking {
    /// Checks required fields and value ranges.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("email", &self.email),
            ("phone", &self.phone),
            ("national_id", &self.national_id),
            ("payment_method", &self.payment_method),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CoreError::invalid_input(format!("{name} is required")));
        }
        if self.end_date < self.start_date {
            return Err(CoreError::invalid_input(
                "end_date must not be before start_date",
            ));
        }
        if !self.total_price.is_finite() || self.total_price <= 0.0 {
            return Err(CoreError::invalid_input("total_price must be positive"));
        }
        Ok(())
    }

    /// Materializes the booking with a fresh id.
    pub fn into_booking(self, created_at: OffsetDateTime) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            car_id: self.car_id,
            customer_id: self.customer_id,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            total_price: self.total_price,
            email: self.email,
            phone: self.phone,
            national_id: self.national_id,
            driver_license: self.driver_license,
            license_expiry: self.license_expiry,
            license_country: self.license_country,
            terms_accepted: self.terms_accepted,
            insurance_confirmed: self.insurance_confirmed,
            driving_record_confirmed: self.driving_record_confirmed,
            payment_method: self.payment_method,
            status: BookingStatus::Confirmed,
            created_at,
        }
    }
}

/// A stored booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub car_id: i64,
    pub customer_id: Uuid,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    pub location: Option<String>,
    pub total_price: f64,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub driver_license: Option<String>,
    #[serde(with = "iso_date::option")]
    pub license_expiry: Option<Date>,
    pub license_country: Option<String>,
    pub terms_accepted: bool,
    pub insurance_confirmed: bool,
    pub driving_record_confirmed: bool,
    pub payment_method: String,
    pub status: BookingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Booking {
    /// Number of rental days, counting both ends.
    pub fn rental_days(&self) -> i64 {
        (self.end_date - self.start_date).whole_days() + 1
    }
}

/// Storage operations for bookings.
#[async_trait]
pub trait BookingStorage: Send + Sync {
    /// Persist a validated booking and return the stored record.
    async fn create(&self, booking: NewBooking) -> Result<Booking>;

    /// Find a booking by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Change the status of a booking.
    ///
    /// Returns `NotFound` if the booking doesn't exist.
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking>;
}
