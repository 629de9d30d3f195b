// Error types for karttimer

use snafu::Snafu;
use std::{io, path::PathBuf};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum KartTimerError {
    // Session database errors
    #[snafu(display("Session database unavailable at {}", path.display()))]
    StorageUnavailable {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[snafu(display("Invalid {field}: {reason}"))]
    ConstraintViolation { field: String, reason: String },
    #[snafu(display("Failed to {operation}"))]
    WriteFailed {
        operation: String,
        source: rusqlite::Error,
    },
    #[snafu(display("Failed to {operation}"))]
    ReadFailed {
        operation: String,
        source: rusqlite::Error,
    },
    #[snafu(display("Could not create storage directory {}", path.display()))]
    StorageDirError { path: PathBuf, source: io::Error },
    #[snafu(display("Storage worker is no longer running"))]
    WorkerDisconnected,

    // Driver profile errors
    #[snafu(display("No driver profile with id {id}"))]
    DriverNotFound { id: String },
    #[snafu(display("Error accessing driver profiles file {}", path.display()))]
    ProfileIOError { path: PathBuf, source: io::Error },
    #[snafu(display("Error parsing driver profiles file {}", path.display()))]
    ProfileSerializeError {
        path: PathBuf,
        source: serde_json::Error,
    },

    // Config management errors
    #[snafu(display("Could not find application data directory to store sessions"))]
    NoDataDir,
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Error accessing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error parsing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Terminal front end errors
    #[snafu(display("Error reading terminal input"))]
    InputError { source: io::Error },
    #[snafu(display("Error writing JSON output"))]
    OutputSerializeError { source: serde_json::Error },
}

impl KartTimerError {
    /// Shorthand for the validation errors raised before anything reaches storage.
    pub fn constraint(field: &str, reason: impl Into<String>) -> Self {
        KartTimerError::ConstraintViolation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Write failures can be retried by the caller; everything else needs a different input
    /// or a restart.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KartTimerError::WriteFailed { .. } | KartTimerError::WorkerDisconnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failures_are_retryable() {
        let err = KartTimerError::WriteFailed {
            operation: "insert session".to_string(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Failed to insert session");
    }

    #[test]
    fn test_constraint_violation_is_not_retryable() {
        let err = KartTimerError::constraint("session_name", "cannot be empty");
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Invalid session_name: cannot be empty");
    }
}
