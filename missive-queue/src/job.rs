use serde::{Deserialize, Serialize};

/// Identifier for a queued email job
///
/// A globally unique ULID assigned by the store at enqueue time. ULIDs are
/// lexicographically sortable by creation time and collision-resistant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId {
    id: ulid::Ulid,
}

impl JobId {
    /// Create a job ID from an existing ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique job ID
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Get the underlying ULID
    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }

    /// Get the timestamp (milliseconds since Unix epoch) encoded in this ULID
    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        self.id.timestamp_ms()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl serde::Serialize for JobId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// Delivery state of a job
///
/// State machine: `Pending --claim--> Processing --success--> Sent`;
/// `Processing --failure below the attempt ceiling--> Pending`;
/// `Processing --failure at the ceiling--> Failed`. `Sent` and `Failed` are
/// terminal. The `Failed` variant carries the last delivery error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting to be claimed by a worker
    Pending,
    /// Claimed by a worker, delivery in flight
    Processing,
    /// Delivered successfully
    Sent,
    /// Exhausted the attempt ceiling
    Failed(String),
}

impl JobStatus {
    /// Whether this status admits no further transitions
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Failed(_))
    }
}

/// The caller-supplied portion of a job, accepted by [`enqueue`]
///
/// [`enqueue`]: crate::store::JobStore::enqueue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    /// Recipient email address (syntactically validated upstream)
    pub recipient: String,
    /// Message subject
    pub subject: String,
    /// Rendered HTML body
    pub html: String,
}

/// A single email-send task tracked through the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJob {
    /// Unique identifier, assigned at enqueue time
    pub id: JobId,
    /// Recipient email address
    pub recipient: String,
    /// Message subject
    pub subject: String,
    /// Rendered HTML body
    pub html: String,
    /// Current delivery state
    pub status: JobStatus,
    /// Number of delivery attempts made so far
    pub attempts: u32,
    /// Unix timestamp when the job was enqueued
    pub created_at: u64,
    /// Unix timestamp of the last status transition
    pub updated_at: u64,
    /// Unix timestamp before which the job must not be reclaimed
    pub next_retry_at: Option<u64>,
    /// Store-assigned insertion sequence; breaks `created_at` ties so claim
    /// order is total
    pub(crate) sequence: u64,
}

impl EmailJob {
    pub(crate) fn create(payload: JobPayload, sequence: u64) -> Self {
        let now = unix_now();

        Self {
            id: JobId::generate(),
            recipient: payload.recipient,
            subject: payload.subject,
            html: payload.html,
            status: JobStatus::Pending,
            attempts: 0,
            created_at: now,
            updated_at: now,
            next_retry_at: None,
            sequence,
        }
    }
}

/// Current Unix timestamp in seconds
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_roundtrip() {
        let id = JobId::generate();
        let text = id.to_string();
        let parsed = JobId::new(ulid::Ulid::from_string(&text).unwrap());
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Sent.is_terminal());
        assert!(JobStatus::Failed("connection refused".to_string()).is_terminal());
    }

    #[test]
    fn test_new_job_starts_pending() {
        let job = EmailJob::create(
            JobPayload {
                recipient: "a@x.com".to_string(),
                subject: "Hi".to_string(),
                html: "<p>Hi</p>".to_string(),
            },
            0,
        );

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.created_at, job.updated_at);
        assert!(job.next_retry_at.is_none());
    }
}
