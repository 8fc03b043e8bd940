//! # drivenow-core
//!
//! Domain types shared by every DriveNow crate:
//!
//! - [`role`] - the closed set of account roles
//! - [`booking`] - rental bookings and their storage trait
//! - [`time`] - injectable clock used by time-sensitive policies
//! - [`error`] - core error type

pub mod booking;
pub mod error;
pub mod role;
pub mod time;

pub use booking::{Booking, BookingStatus, BookingStorage, NewBooking};
pub use error::{CoreError, Result};
pub use role::Role;
pub use time::{Clock, ManualClock, SystemClock, now_utc};
