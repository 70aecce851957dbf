//! Parcel store error types
//!
//! Storage failures, missing keys, and business-rule rejections are kept as
//! distinct variants so callers can react to a guard violation without
//! string-matching SQLite messages.

use crate::parcel::ParcelStatus;
use thiserror::Error;

/// Error category for structured logging and exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `parcel.toml` or env misconfigured
    ConfigError,
    /// SQLite rejected or failed a statement, or a row could not be decoded
    StorageError,
    /// A lookup by key matched no row
    NotFound,
    /// A mutation was rejected because the parcel is past `registered`
    GuardViolation,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::StorageError => "STORAGE_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::GuardViolation => "GUARD_VIOLATION",
        }
    }

    /// Whether this is a business outcome the caller caused, as opposed to
    /// an infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotFound | Self::GuardViolation)
    }
}

/// Mutations gated on the `registered` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    SetAddress,
    Delete,
}

impl GuardedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetAddress => "address change",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for GuardedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parcel store error with category and context
#[derive(Debug, Error)]
pub enum ParcelError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("parcel {number} not found")]
    NotFound { number: i64 },

    #[error("{action} not permitted for parcel {number}: status is {status}, expected registered")]
    Guard {
        number: i64,
        action: GuardedAction,
        status: ParcelStatus,
    },
}

impl ParcelError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::ConfigError,
            Self::Storage { .. } => ErrorCategory::StorageError,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Guard { .. } => ErrorCategory::GuardViolation,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error with source
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(number: i64) -> Self {
        Self::NotFound { number }
    }

    pub fn guard(number: i64, action: GuardedAction, status: ParcelStatus) -> Self {
        Self::Guard {
            number,
            action,
            status,
        }
    }
}

/// Result type for parcel store operations
pub type Result<T> = std::result::Result<T, ParcelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_categories() {
        assert_eq!(
            ParcelError::config("bad").category(),
            ErrorCategory::ConfigError
        );
        assert_eq!(
            ParcelError::not_found(7).category().as_str(),
            "NOT_FOUND"
        );
        let guard = ParcelError::guard(7, GuardedAction::Delete, ParcelStatus::Sent);
        assert_eq!(guard.category(), ErrorCategory::GuardViolation);
        assert!(guard.category().is_rejection());
        assert!(!ErrorCategory::StorageError.is_rejection());
    }

    #[test]
    fn test_display_messages() {
        let guard = ParcelError::guard(3, GuardedAction::SetAddress, ParcelStatus::Delivered);
        assert_eq!(
            guard.to_string(),
            "address change not permitted for parcel 3: status is delivered, expected registered"
        );
        assert_eq!(ParcelError::not_found(9).to_string(), "parcel 9 not found");
    }

    #[test]
    fn test_storage_keeps_source() {
        let io = std::io::Error::other("disk gone");
        let err = ParcelError::storage_with_source("failed to insert parcel", io);
        assert_eq!(err.to_string(), "storage error: failed to insert parcel");
        assert!(err.source().is_some());
    }
}
