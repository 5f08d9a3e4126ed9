//! Error types for pext-store
//!
//! Read paths degrade to empty results where the store contract allows
//! it; these errors surface on mutating operations and on document I/O.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// User not found
    UserNotFound,
    /// Account not found
    AccountNotFound,
    /// Shard file missing for a user
    ShardMissing,
    /// Mobile number already registered
    DuplicateMobile,
    /// IO error
    IoError,
    /// Persisted document could not be decoded
    InvalidDocument,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::UserNotFound => write!(f, "USER_NOT_FOUND"),
            ErrorCode::AccountNotFound => write!(f, "ACCOUNT_NOT_FOUND"),
            ErrorCode::ShardMissing => write!(f, "SHARD_MISSING"),
            ErrorCode::DuplicateMobile => write!(f, "DUPLICATE_MOBILE"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::InvalidDocument => write!(f, "INVALID_DOCUMENT"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for pext-store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Account not found: {id}")]
    AccountNotFound { id: i64 },

    #[error("No shard exists for user {user_id}")]
    ShardMissing { user_id: i64 },

    #[error("Mobile number already registered: {mobile}")]
    DuplicateMobile { mobile: String },

    #[error("IO error")]
    Io(#[from] io::Error),

    #[error("Invalid document {path}: {message}")]
    InvalidDocument { path: String, message: String },
}

impl StoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::UserNotFound { .. } => ErrorCode::UserNotFound,
            StoreError::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            StoreError::ShardMissing { .. } => ErrorCode::ShardMissing,
            StoreError::DuplicateMobile { .. } => ErrorCode::DuplicateMobile,
            StoreError::Io(_) => ErrorCode::IoError,
            StoreError::InvalidDocument { .. } => ErrorCode::InvalidDocument,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StoreError::UserNotFound { .. } => ErrorSeverity::Info,
            StoreError::AccountNotFound { .. } => ErrorSeverity::Info,
            StoreError::ShardMissing { .. } => ErrorSeverity::Warning,
            StoreError::DuplicateMobile { .. } => ErrorSeverity::Warning,
            StoreError::Io(_) => ErrorSeverity::Error,
            StoreError::InvalidDocument { .. } => ErrorSeverity::Error,
        }
    }
}

/// Result type with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::UserNotFound.to_string(), "USER_NOT_FOUND");
        assert_eq!(ErrorCode::DuplicateMobile.to_string(), "DUPLICATE_MOBILE");
        assert_eq!(ErrorCode::InvalidDocument.to_string(), "INVALID_DOCUMENT");
    }

    #[test]
    fn test_store_error_code() {
        let error = StoreError::AccountNotFound { id: 7 };
        assert_eq!(error.code(), ErrorCode::AccountNotFound);

        let error = StoreError::DuplicateMobile { mobile: "555".to_string() };
        assert_eq!(error.code(), ErrorCode::DuplicateMobile);
    }

    #[test]
    fn test_store_error_severity() {
        let error = StoreError::UserNotFound { id: 1 };
        assert_eq!(error.severity(), ErrorSeverity::Info);

        let error = StoreError::ShardMissing { user_id: 1 };
        assert_eq!(error.severity(), ErrorSeverity::Warning);

        let error = StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(error.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let error: StoreError = io_err.into();
        assert_eq!(error.code(), ErrorCode::IoError);
    }
}
