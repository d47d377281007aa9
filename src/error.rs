//! Error types for upslot
//!
//! Centralized error handling using thiserror. Finding no candidate to start is
//! not an error and never shows up here.

use thiserror::Error;

use crate::domain::{Sequence, TransferStatus};

/// All error types that can occur in upslot
#[derive(Debug, Error)]
pub enum UpslotError {
    /// No live transfer carries the given sequence
    #[error("Transfer not found: {0}")]
    TransferNotFound(Sequence),

    /// Status change the caller is not allowed to make
    #[error("Invalid transition for transfer {sequence}: {from} -> {to}")]
    InvalidTransition {
        sequence: Sequence,
        from: TransferStatus,
        to: TransferStatus,
    },

    /// Transfer queue failed its integrity checks
    #[error("Corrupt queue: {0}")]
    CorruptQueue(String),

    /// Shared manager lock was poisoned by a panicking holder
    #[error("Lock error: {0}")]
    Lock(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for upslot operations
pub type Result<T> = std::result::Result<T, UpslotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_not_found_error() {
        let err = UpslotError::TransferNotFound(Sequence(7));
        assert_eq!(err.to_string(), "Transfer not found: #7");
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = UpslotError::InvalidTransition {
            sequence: Sequence(3),
            from: TransferStatus::Queued,
            to: TransferStatus::Transferring,
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition for transfer #3: Queued -> Transferring"
        );
    }

    #[test]
    fn test_corrupt_queue_error() {
        let err = UpslotError::CorruptQueue("sequence #4 out of order".to_string());
        assert_eq!(err.to_string(), "Corrupt queue: sequence #4 out of order");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: UpslotError = io_err.into();
        assert!(matches!(err, UpslotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: UpslotError = json_err.into();
        assert!(matches!(err, UpslotError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<u64> {
            Ok(42)
        }

        fn returns_err() -> Result<u64> {
            Err(UpslotError::Lock("poisoned".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
