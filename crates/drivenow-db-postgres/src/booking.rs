//! Booking storage.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;
use uuid::Uuid;

use drivenow_core::{Booking, BookingStatus, BookingStorage, NewBooking, Result, now_utc};

use crate::{PgPool, StorageError, StorageResult};

const BOOKING_COLUMNS: &str = "id, car_id, customer_id, start_date, end_date, location, \
     total_price, email, phone, national_id, driver_license, license_expiry, license_country, \
     terms_accepted, insurance_confirmed, driving_record_confirmed, payment_method, status, \
     created_at";

fn booking_from_row(row: &PgRow) -> StorageResult<Booking> {
    let status: String = row.try_get("status")?;
    let status: BookingStatus = status
        .parse()
        .map_err(|_| StorageError::invalid_data(format!("unknown booking status '{status}'")))?;

    Ok(Booking {
        id: row.try_get("id")?,
        car_id: row.try_get("car_id")?,
        customer_id: row.try_get("customer_id")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        location: row.try_get("location")?,
        total_price: row.try_get("total_price")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        national_id: row.try_get("national_id")?,
        driver_license: row.try_get("driver_license")?,
        license_expiry: row.try_get("license_expiry")?,
        license_country: row.try_get("license_country")?,
        terms_accepted: row.try_get("terms_accepted")?,
        insurance_confirmed: row.try_get("insurance_confirmed")?,
        driving_record_confirmed: row.try_get("driving_record_confirmed")?,
        payment_method: row.try_get("payment_method")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL-backed [`BookingStorage`].
#[derive(Debug, Clone)]
pub struct PgBookingStorage {
    pool: Arc<PgPool>,
}

impl PgBookingStorage {
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStorage for PgBookingStorage {
    async fn create(&self, booking: NewBooking) -> Result<Booking> {
        booking.validate()?;
        let booking = booking.into_booking(now_utc());

        query(
            r#"
            INSERT INTO bookings (id, car_id, customer_id, start_date, end_date, location,
                                  total_price, email, phone, national_id, driver_license,
                                  license_expiry, license_country, terms_accepted,
                                  insurance_confirmed, driving_record_confirmed,
                                  payment_method, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(booking.id)
        .bind(booking.car_id)
        .bind(booking.customer_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(&booking.location)
        .bind(booking.total_price)
        .bind(&booking.email)
        .bind(&booking.phone)
        .bind(&booking.national_id)
        .bind(&booking.driver_license)
        .bind(booking.license_expiry)
        .bind(&booking.license_country)
        .bind(booking.terms_accepted)
        .bind(booking.insurance_confirmed)
        .bind(booking.driving_record_confirmed)
        .bind(&booking.payment_method)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&*self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = query(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.as_ref().map(booking_from_row).transpose()?)
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let sql = format!("UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {BOOKING_COLUMNS}");
        let row = query(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(StorageError::from)?
            .ok_or_else(|| StorageError::not_found(id.to_string()))?;
        Ok(booking_from_row(&row)?)
    }
}
