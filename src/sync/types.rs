//! Sync engine error definitions.

use thiserror::Error;

use crate::chain::ChainError;

/// Errors that abort a scan window or the head tracker.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Block, log or subscription retrieval failed.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The checkpoint store could not be read or written.
    #[error("Checkpoint storage error: {0}")]
    Storage(String),

    /// The transfer sink declined a record.
    #[error("Transfer sink rejected a record at height {height}: {reason}")]
    SinkRejected { height: u64, reason: String },

    /// The window would leave unprocessed heights behind the checkpoint.
    #[error("Window starting at {low} leaves a gap after checkpoint {checkpoint}")]
    WindowGap { checkpoint: u64, low: u64 },

    /// `low > high`.
    #[error("Invalid scan window [{low}, {high}]")]
    InvalidWindow { low: u64, high: u64 },
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Rejection returned by a [`TransferSink`](crate::sync::TransferSink).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::SinkRejected {
            height: 12,
            reason: "queue full".into(),
        };
        assert_eq!(
            err.to_string(),
            "Transfer sink rejected a record at height 12: queue full"
        );

        let err: SyncError = ChainError::Timeout(3).into();
        assert_eq!(err.to_string(), "RPC timeout after 3 seconds");
    }
}
