//! Authentication configuration.
//!
//! The lockout threshold and window are fixed policy constants in
//! [`throttle`](crate::throttle) and are deliberately not configurable.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! otp_ttl = "5m"
//! audit_queue_capacity = 1024
//! admin_logs_default = 50
//! admin_logs_max = 500
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of a one-time verification code.
    #[serde(with = "humantime_serde")]
    pub otp_ttl: Duration,

    /// Capacity of the audit write queue.
    /// Events beyond this are dropped with a warning instead of blocking.
    pub audit_queue_capacity: usize,

    /// Number of audit events returned when the admin doesn't ask for a limit.
    pub admin_logs_default: usize,

    /// Upper bound on the number of audit events returned at once.
    pub admin_logs_max: usize,

    /// Minimum accepted password length for registration and reset.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::from_secs(300), // 5 minutes
            audit_queue_capacity: 1024,
            admin_logs_default: 50,
            admin_logs_max: 500,
            min_password_length: 8,
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `otp_ttl` is zero
    /// - `audit_queue_capacity` is zero
    /// - `admin_logs_default` is zero or greater than `admin_logs_max`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.otp_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "otp_ttl must be greater than zero".to_string(),
            ));
        }

        if self.audit_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "audit_queue_capacity must be greater than zero".to_string(),
            ));
        }

        if self.admin_logs_default == 0 || self.admin_logs_default > self.admin_logs_max {
            return Err(ConfigError::InvalidValue(format!(
                "admin_logs_default must be between 1 and admin_logs_max ({})",
                self.admin_logs_max
            )));
        }

        Ok(())
    }

    /// Clamps a requested audit log page size to the configured bounds.
    #[must_use]
    pub fn clamp_log_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(0) | None => self.admin_logs_default,
            Some(n) => n.min(self.admin_logs_max),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}
