//! Security audit trail.
//!
//! - [`event`] - the event model and its builder
//! - [`sink`] - the queued writer that persists events off the request path

pub mod event;
pub mod sink;

pub use event::{AuditEvent, AuditEventBuilder, AuditOutcome, AuditSource, Severity};
pub use sink::{AuditRecorder, AuditSink};
