use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use async_trait::async_trait;

use crate::{
    QueueError,
    job::{EmailJob, JobId, JobPayload, JobStatus, unix_now},
    store::{JobStore, QueueCounts},
};

/// In-memory job store implementation
///
/// Jobs live in a `HashMap` protected by an `RwLock`; a single write-lock
/// critical section makes every state transition atomic with respect to
/// concurrent workers, which is what enforces the single-claim invariant in
/// `claim_next`.
///
/// # Capacity Management
/// The store can be configured with a maximum job count. When capacity is
/// reached, `enqueue` fails with [`QueueError::Unavailable`] until terminal
/// jobs are drained.
///
/// # Ordering
/// Each job receives a monotonically increasing sequence number at enqueue.
/// `claim_next` takes the minimum-sequence eligible job, so claim order is
/// FIFO by creation time with second-resolution timestamp ties broken by
/// insertion order.
#[derive(Debug, Clone)]
pub struct MemoryJobStore {
    pub(crate) jobs: Arc<RwLock<HashMap<JobId, EmailJob>>>,
    sequence: Arc<AtomicU64>,
    /// Maximum number of jobs to hold (None = unlimited)
    capacity: Option<usize>,
}

impl MemoryJobStore {
    /// Create a new empty store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(0)),
            capacity: None,
        }
    }

    /// Create a new store with a capacity limit
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(0)),
            capacity: Some(capacity),
        }
    }

    /// Get the current number of jobs in the store
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the
    /// underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configured capacity (None = unlimited)
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn enqueue(&self, payload: JobPayload) -> crate::Result<JobId> {
        let mut jobs = self.jobs.write()?;

        if let Some(cap) = self.capacity
            && jobs.len() >= cap
        {
            return Err(QueueError::Unavailable(format!(
                "queue capacity reached: {}/{cap} jobs",
                jobs.len()
            )));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let job = EmailJob::create(payload, sequence);
        let id = job.id.clone();
        jobs.insert(id.clone(), job);

        Ok(id)
    }

    async fn claim_next(&self) -> crate::Result<Option<EmailJob>> {
        let now = unix_now();
        let mut jobs = self.jobs.write()?;

        let claimable = jobs
            .values()
            .filter(|job| {
                job.status == JobStatus::Pending
                    && job.next_retry_at.is_none_or(|at| at <= now)
            })
            .min_by_key(|job| job.sequence)
            .map(|job| job.id.clone());

        let Some(id) = claimable else {
            return Ok(None);
        };

        // The write guard held since selection means no other claimer can
        // have observed this job as Pending.
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;
        job.status = JobStatus::Processing;
        job.updated_at = unix_now();

        Ok(Some(job.clone()))
    }

    async fn mark_sent(&self, id: &JobId) -> crate::Result<()> {
        let mut jobs = self.jobs.write()?;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;

        match &job.status {
            JobStatus::Sent => Ok(()),
            JobStatus::Processing => {
                job.status = JobStatus::Sent;
                job.next_retry_at = None;
                job.updated_at = unix_now();
                Ok(())
            }
            other => Err(QueueError::InvalidTransition {
                id: id.clone(),
                from: other.clone(),
                to: "sent",
            }),
        }
    }

    async fn mark_failed(
        &self,
        id: &JobId,
        error: &str,
        max_attempts: u32,
        next_retry_at: Option<SystemTime>,
    ) -> crate::Result<JobStatus> {
        let mut jobs = self.jobs.write()?;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;

        if job.status != JobStatus::Processing {
            return Err(QueueError::InvalidTransition {
                id: id.clone(),
                from: job.status.clone(),
                to: "failed",
            });
        }

        job.attempts += 1;
        job.updated_at = unix_now();

        if job.attempts < max_attempts {
            job.status = JobStatus::Pending;
            job.next_retry_at = next_retry_at.map(|at| {
                at.duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs()
            });
        } else {
            job.status = JobStatus::Failed(error.to_string());
            job.next_retry_at = None;
        }

        Ok(job.status.clone())
    }

    async fn get(&self, id: &JobId) -> crate::Result<EmailJob> {
        self.jobs
            .read()?
            .get(id)
            .cloned()
            .ok_or_else(|| QueueError::NotFound(id.clone()))
    }

    async fn list(&self) -> crate::Result<Vec<JobId>> {
        let jobs = self.jobs.read()?;

        // Insertion sequence, not ULID order: same-millisecond ULIDs sort by
        // their random bits
        let mut entries: Vec<_> = jobs
            .values()
            .map(|job| (job.sequence, job.id.clone()))
            .collect();
        entries.sort_by_key(|&(sequence, _)| sequence);

        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }

    async fn counts(&self) -> crate::Result<QueueCounts> {
        let jobs = self.jobs.read()?;
        let mut counts = QueueCounts::default();

        for job in jobs.values() {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Sent => counts.sent += 1,
                JobStatus::Failed(_) => counts.failed += 1,
            }
        }

        Ok(counts)
    }
}
