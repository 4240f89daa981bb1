//! Error types for fincore.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for fincore operations
pub type FinResult<T> = Result<T, FinError>;

/// Main error type for fincore operations
#[derive(Error, Debug)]
pub enum FinError {
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage operation failed: {0}")]
    StorageOperation(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl FinError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FinError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new sync error
    pub fn sync(message: impl Into<String>) -> Self {
        FinError::Sync(message.into())
    }

    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        FinError::Network(message.into())
    }

    /// Create a new storage operation error
    pub fn storage_op(message: impl Into<String>) -> Self {
        FinError::StorageOperation(message.into())
    }
}

/// Validation error with field and message
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for FinError {
    fn from(err: ValidationError) -> Self {
        FinError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("test_field", "test message");
        assert_eq!(err.to_string(), "test_field: test message");
    }

    #[test]
    fn test_fin_error_validation() {
        let err = FinError::validation("field", "message");
        assert!(matches!(err, FinError::Validation { .. }));
    }

    #[test]
    fn test_fin_error_from_validation_error() {
        let err: FinError = ValidationError::new("amount", "must be positive").into();
        assert!(matches!(err, FinError::Validation { .. }));
    }
}
