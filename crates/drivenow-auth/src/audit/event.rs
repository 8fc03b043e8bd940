//! Audit event model.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// How alarming an event is when shown to an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }

    /// Parses a stored severity tag. Unknown tags are read as `Info`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "success" => Severity::Success,
            "warning" => Severity::Warning,
            "danger" => Severity::Danger,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failed,
    Blocked,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failed => "failed",
            AuditOutcome::Blocked => "blocked",
        }
    }

    /// Parses a stored outcome tag. Unknown tags are read as `Failed`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "success" => AuditOutcome::Success,
            "blocked" => AuditOutcome::Blocked,
            _ => AuditOutcome::Failed,
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSource {
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl AuditSource {
    pub fn new(ip_address: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }

    /// Source for events raised by the system itself.
    pub fn system() -> Self {
        Self::default()
    }
}

/// An immutable record of a security-relevant action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    /// Short free-form tag, e.g. "Login Failure" or "NEW_BOOKING".
    pub action: String,
    pub message: String,
    pub severity: Severity,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub outcome: AuditOutcome,
}

impl AuditEvent {
    /// Starts building an event.
    pub fn builder(action: impl Into<String>, message: impl Into<String>) -> AuditEventBuilder {
        AuditEventBuilder::new(action, message)
    }
}

/// Builder for [`AuditEvent`].
///
/// Defaults to `info` severity and `success` outcome.
#[derive(Debug, Clone)]
pub struct AuditEventBuilder {
    action: String,
    message: String,
    severity: Severity,
    outcome: AuditOutcome,
    source: AuditSource,
}

impl AuditEventBuilder {
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
            severity: Severity::Info,
            outcome: AuditOutcome::Success,
            source: AuditSource::default(),
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn source(mut self, source: &AuditSource) -> Self {
        self.source = source.clone();
        self
    }

    pub fn ip_address(mut self, ip: IpAddr) -> Self {
        self.source.ip_address = Some(ip);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.source.user_agent = Some(ua.into());
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn current_severity(&self) -> Severity {
        self.severity
    }

    pub fn current_outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Builds the event stamped with the given time.
    pub fn build_at(self, recorded_at: OffsetDateTime) -> AuditEvent {
        AuditEvent {
            id: Uuid::new_v4(),
            recorded_at,
            action: self.action,
            message: self.message,
            severity: self.severity,
            ip_address: self.source.ip_address,
            user_agent: self.source.user_agent,
            outcome: self.outcome,
        }
    }

    /// Builds the event stamped with the current time.
    pub fn build(self) -> AuditEvent {
        self.build_at(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let event = AuditEvent::builder("Registration", "New customer account").build();
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.outcome, AuditOutcome::Success);
        assert!(event.ip_address.is_none());
        assert!(event.user_agent.is_none());
    }

    #[test]
    fn test_builder_with_source() {
        let source = AuditSource::new(
            Some("10.0.0.7".parse().unwrap()),
            Some("curl/8.0".to_string()),
        );
        let event = AuditEvent::builder("Login Failure", "Wrong password for a@b.c")
            .severity(Severity::Warning)
            .outcome(AuditOutcome::Failed)
            .source(&source)
            .build();

        assert_eq!(event.ip_address, Some("10.0.0.7".parse().unwrap()));
        assert_eq!(event.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(event.outcome, AuditOutcome::Failed);
    }

    #[test]
    fn test_event_serializes_tags_lowercase() {
        let event = AuditEvent::builder("Login Blocked", "locked")
            .severity(Severity::Danger)
            .outcome(AuditOutcome::Blocked)
            .ip_address("127.0.0.1".parse().unwrap())
            .build();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["severity"], "danger");
        assert_eq!(json["outcome"], "blocked");
        assert_eq!(json["ip_address"], "127.0.0.1");
    }

    #[test]
    fn test_tags_parse_leniently() {
        assert_eq!(Severity::from_tag("warning"), Severity::Warning);
        assert_eq!(Severity::from_tag("critical"), Severity::Info);
        assert_eq!(AuditOutcome::from_tag("blocked"), AuditOutcome::Blocked);
        assert_eq!(AuditOutcome::from_tag("???"), AuditOutcome::Failed);
    }
}
