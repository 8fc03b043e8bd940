//! In-memory storage backend for DriveNow.
//!
//! Implements every storage trait with concurrent maps held in process
//! memory. Nothing survives a restart; use it for tests and local runs.
//!
//! # Example
//!
//! ```ignore
//! use drivenow_db_memory::InMemoryBackend;
//!
//! let backend = InMemoryBackend::new();
//! let sink = AuditSink::spawn(backend.audit.clone(), 1024);
//! ```

pub mod account;
pub mod audit;
pub mod booking;

use std::sync::Arc;

pub use account::InMemoryAccountStorage;
pub use audit::InMemoryAuditStorage;
pub use booking::InMemoryBookingStorage;

/// All in-memory stores, ready to hand to the services.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    pub accounts: Arc<InMemoryAccountStorage>,
    pub audit: Arc<InMemoryAuditStorage>,
    pub bookings: Arc<InMemoryBookingStorage>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}
