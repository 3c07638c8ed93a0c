//! Error types for newsroom

use thiserror::Error;

/// Errors that can occur while talking to the content store or
/// validating input bound for it
#[derive(Debug, Error)]
pub enum NewsError {
    /// The remote store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Store-reported failure carrying an HTTP-like status code
    #[error("Store error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Caller is not authenticated
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input rejected at the store boundary
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Post, comment or user not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single attempt exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure (config loading)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NewsError {
    /// Shorthand for a status-coded store failure
    pub fn status_code(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP-like status carried by this failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Validation(_) => Some(422),
            _ => None,
        }
    }
}

/// Result type alias for newsroom operations
pub type Result<T> = std::result::Result<T, NewsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(NewsError::Unauthorized("x".into()).status(), Some(401));
        assert_eq!(NewsError::Forbidden("x".into()).status(), Some(403));
        assert_eq!(NewsError::NotFound("x".into()).status(), Some(404));
        assert_eq!(NewsError::Validation("x".into()).status(), Some(422));
        assert_eq!(NewsError::status_code(503, "down").status(), Some(503));
        assert_eq!(NewsError::Connection("x".into()).status(), None);
        assert_eq!(NewsError::Timeout("x".into()).status(), None);
    }

    #[test]
    fn test_display_messages() {
        let err = NewsError::status_code(502, "bad gateway");
        assert_eq!(err.to_string(), "Store error (502): bad gateway");

        let err = NewsError::Connection("unable to connect".into());
        assert_eq!(err.to_string(), "Connection error: unable to connect");
    }
}
