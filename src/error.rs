//! Unified error hierarchy for racetracker
//!
//! The reconciliation core never fails; these errors cover the store
//! adapters, importers and configuration around it.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all racetracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Store adapter errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Activity or plan import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the training store adapters
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure in the relational adapter
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Document (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot file could not be read or written
    #[error("Snapshot IO error at {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored record could not be mapped to a domain value
    #[error("Invalid record in {collection}: {reason}")]
    InvalidRecord { collection: String, reason: String },

    /// Record not found
    #[error("Record not found: {collection}.{id}")]
    NotFound { collection: String, id: String },

    /// Write attempted without a user identity
    #[error("No user is signed in")]
    Unauthenticated,
}

/// Import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Invalid data structure
    #[error("Invalid data structure: {reason}")]
    InvalidStructure { reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for racetracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrackerError::Store(StoreError::Sqlite(_))
                | TrackerError::Store(StoreError::Snapshot { .. })
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrackerError::Store(StoreError::NotFound { .. }) => ErrorSeverity::Warning,
            TrackerError::Store(StoreError::Unauthenticated) => ErrorSeverity::Warning,
            TrackerError::Validation(_) => ErrorSeverity::Warning,
            TrackerError::Import(_) => ErrorSeverity::Warning,
            TrackerError::Store(_) => ErrorSeverity::Error,
            TrackerError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::Store(StoreError::Unauthenticated) => {
                "Not signed in. Set user_id in the configuration file.".to_string()
            }
            TrackerError::Store(StoreError::Sqlite(_)) => {
                "Unable to open the training database. Please check the store path.".to_string()
            }
            TrackerError::Import(ImportError::Read { path, .. }) => {
                format!("Could not read import file: {}", path.display())
            }
            TrackerError::Import(ImportError::UnsupportedFormat { format }) => {
                format!("Unsupported import format '{}'. Use json or csv.", format)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = TrackerError::Store(StoreError::NotFound {
            collection: "weeks".to_string(),
            id: "7".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = TrackerError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_error_retryable() {
        let err = TrackerError::from(StoreError::Snapshot {
            path: PathBuf::from("racetracker.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "busy"),
        });
        assert!(err.is_retryable());

        let err = TrackerError::Validation("test".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = TrackerError::from(StoreError::Unauthenticated);
        assert!(err.user_message().contains("Not signed in"));

        let err = TrackerError::from(ImportError::Read {
            path: PathBuf::from("activities.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });
        assert!(err.user_message().contains("activities.json"));
    }
}
