use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use drivenow_core::{Booking, BookingStatus, BookingStorage, CoreError, NewBooking, Result, now_utc};

#[derive(Debug, Default)]
pub struct InMemoryBookingStorage {
    bookings: DashMap<Uuid, Booking>,
}

impl InMemoryBookingStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStorage for InMemoryBookingStorage {
    async fn create(&self, booking: NewBooking) -> Result<Booking> {
        booking.validate()?;
        let booking = booking.into_booking(now_utc());
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|b| b.value().clone()))
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let mut booking = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("Booking", id.to_string()))?;
        booking.status = status;
        Ok(booking.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn new_booking() -> NewBooking {
        NewBooking {
            car_id: 3,
            customer_id: Uuid::new_v4(),
            start_date: date!(2025-04-10),
            end_date: date!(2025-04-12),
            location: None,
            total_price: 150.0,
            email: "c@x.com".into(),
            phone: "0100".into(),
            national_id: "NID".into(),
            driver_license: None,
            license_expiry: None,
            license_country: None,
            terms_accepted: true,
            insurance_confirmed: false,
            driving_record_confirmed: false,
            payment_method: "cash".into(),
        }
    }

    #[tokio::test]
    async fn test_create_find_update() {
        let storage = InMemoryBookingStorage::new();
        let booking = storage.create(new_booking()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let found = storage.find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(found.car_id, 3);

        let updated = storage
            .update_status(booking.id, BookingStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_invalid_booking_rejected() {
        let storage = InMemoryBookingStorage::new();
        let mut bad = new_booking();
        bad.payment_method = String::new();
        assert!(storage.create(bad).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let storage = InMemoryBookingStorage::new();
        let err = storage
            .update_status(Uuid::new_v4(), BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
