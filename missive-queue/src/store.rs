use std::time::SystemTime;

use async_trait::async_trait;
use serde::Serialize;

use crate::job::{EmailJob, JobId, JobPayload, JobStatus};

/// Per-status job totals, for operator introspection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub processing: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Storage backend for email jobs
///
/// The store is the single shared mutable resource between producers and
/// workers; every mutation here must be atomic with respect to concurrent
/// callers. In particular `claim_next` is the sole serialization point
/// guaranteeing at most one active processor per job.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Persist a new job in `Pending` state and return its assigned ID
    ///
    /// # Errors
    /// [`QueueError::Unavailable`] when the backing store cannot accept the
    /// write.
    ///
    /// [`QueueError::Unavailable`]: crate::error::QueueError::Unavailable
    async fn enqueue(&self, payload: JobPayload) -> crate::Result<JobId>;

    /// Atomically take ownership of the oldest claimable `Pending` job
    ///
    /// Jobs are claimed FIFO by creation, ties broken by insertion sequence.
    /// Jobs whose `next_retry_at` lies in the future are skipped. The
    /// returned job has already been transitioned to `Processing`; no other
    /// caller can observe it as `Pending` again unless delivery fails below
    /// the attempt ceiling.
    ///
    /// Returns `None` when no job is claimable.
    ///
    /// # Errors
    /// If the store cannot be accessed.
    async fn claim_next(&self) -> crate::Result<Option<EmailJob>>;

    /// Record a successful delivery: `Processing -> Sent`
    ///
    /// Idempotent no-op when the job is already `Sent`.
    ///
    /// # Errors
    /// [`QueueError::NotFound`] for an unknown job,
    /// [`QueueError::InvalidTransition`] when the job was never claimed.
    ///
    /// [`QueueError::NotFound`]: crate::error::QueueError::NotFound
    /// [`QueueError::InvalidTransition`]: crate::error::QueueError::InvalidTransition
    async fn mark_sent(&self, id: &JobId) -> crate::Result<()>;

    /// Record a failed delivery attempt and return the resulting status
    ///
    /// Increments the attempt count. Below `max_attempts` the job goes back
    /// to `Pending`, eligible for re-claim once `next_retry_at` has passed;
    /// at the ceiling it becomes terminal `Failed` carrying `error`.
    ///
    /// # Errors
    /// [`QueueError::NotFound`] for an unknown job,
    /// [`QueueError::InvalidTransition`] when the job was never claimed.
    ///
    /// [`QueueError::NotFound`]: crate::error::QueueError::NotFound
    /// [`QueueError::InvalidTransition`]: crate::error::QueueError::InvalidTransition
    async fn mark_failed(
        &self,
        id: &JobId,
        error: &str,
        max_attempts: u32,
        next_retry_at: Option<SystemTime>,
    ) -> crate::Result<JobStatus>;

    /// Read a job by ID
    ///
    /// # Errors
    /// [`QueueError::NotFound`] for an unknown job.
    ///
    /// [`QueueError::NotFound`]: crate::error::QueueError::NotFound
    async fn get(&self, id: &JobId) -> crate::Result<EmailJob>;

    /// List all job IDs, sorted by creation time
    ///
    /// # Errors
    /// If the store cannot be accessed.
    async fn list(&self) -> crate::Result<Vec<JobId>>;

    /// Count jobs per status
    ///
    /// # Errors
    /// If the store cannot be accessed.
    async fn counts(&self) -> crate::Result<QueueCounts>;
}
