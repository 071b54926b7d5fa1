//! Error types for the missive-queue crate.

use thiserror::Error;

use crate::job::{JobId, JobStatus};

/// Top-level queue error type.
///
/// All queue operations return this error type, which categorizes failures
/// into availability, lookup, and state-machine errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The backing store cannot accept the operation (capacity reached,
    /// store offline).
    #[error("queue unavailable: {0}")]
    Unavailable(String),

    /// Job not found in the store.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The requested transition is not permitted from the job's current
    /// status.
    #[error("invalid status transition for job {id}: {from:?} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: &'static str,
    },

    /// Internal error (lock poisoning, etc.).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for QueueError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
