pub mod backends;
pub mod config;
pub mod error;
pub mod job;
pub mod store;

pub use backends::{MemoryJobStore, TestJobStore};
pub use config::{MemoryConfig, QueueConfig};
pub use error::{QueueError, Result};
pub use job::{EmailJob, JobId, JobPayload, JobStatus};
pub use store::{JobStore, QueueCounts};
