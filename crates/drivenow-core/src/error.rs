use thiserror::Error;

/// Core error types for DriveNow operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid booking status: {0}")]
    InvalidBookingStatus(String),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Not found: {entity}/{id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),
}

impl CoreError {
    /// Create a new InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new NotFound error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a new Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRole(_)
                | Self::InvalidBookingStatus(_)
                | Self::InvalidInput { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::JsonError(_)
                | Self::UuidError(_)
        )
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::not_found("Booking", "42");
        assert_eq!(err.to_string(), "Not found: Booking/42");

        let err = CoreError::invalid_input("price must be positive");
        assert_eq!(err.to_string(), "Invalid input: price must be positive");
    }

    #[test]
    fn test_error_categories() {
        assert!(CoreError::conflict("dup").is_client_error());
        assert!(!CoreError::conflict("dup").is_server_error());
        assert!(CoreError::storage("down").is_server_error());
        assert!(!CoreError::storage("down").is_client_error());
    }
}
