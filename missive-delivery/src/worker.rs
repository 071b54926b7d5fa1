//! The consuming half of the dispatch pipeline.
//!
//! The worker runs continuously and independently of any producer: it polls
//! the job store, claims pending jobs, and hands them to the mail transport,
//! recording the outcome of every attempt on the job.

use std::{sync::Arc, time::Duration};

use missive_common::{Signal, internal};
use missive_queue::{EmailJob, JobStatus, JobStore};
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{error::WorkerError, mailer::Mailer, retry::RetryPolicy};

const fn default_poll_interval() -> u64 {
    5
}

fn default_max_concurrent() -> usize {
    num_cpus::get()
}

/// Background consumer of the email job queue
///
/// One or more workers may run against the same store; `claim_next` is the
/// sole serialization point, so no two workers ever process the same job.
#[derive(Debug, Deserialize)]
pub struct Worker {
    /// How often to poll the store for claimable jobs (in seconds)
    ///
    /// This is also the idle backoff: a worker that finds nothing to claim
    /// sleeps until the next tick.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum number of jobs delivered in parallel per tick
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Retry policy applied to failed deliveries
    #[serde(default)]
    pub retry: RetryPolicy,

    /// The job store to consume from (initialized in `init()`)
    #[serde(skip)]
    store: Option<Arc<dyn JobStore>>,

    /// The transport to deliver through (initialized in `init()`)
    #[serde(skip)]
    mailer: Option<Arc<dyn Mailer>>,
}

impl Default for Worker {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_concurrent: default_max_concurrent(),
            retry: RetryPolicy::default(),
            store: None,
            mailer: None,
        }
    }
}

impl Worker {
    /// Initialize the worker with its store and transport
    pub fn init(&mut self, store: Arc<dyn JobStore>, mailer: Arc<dyn Mailer>) {
        internal!("Initialising delivery worker ...");
        self.store = Some(store);
        self.mailer = Some(mailer);
    }

    /// Run the worker
    ///
    /// Runs until a shutdown signal is received. Each poll tick drains every
    /// currently-claimable job, delivering up to `max_concurrent` in
    /// parallel. Claimed jobs always run to completion; the shutdown signal
    /// is only observed between batches, so no delivery is cancelled
    /// mid-flight.
    ///
    /// # Errors
    /// Returns an error if `init()` was not called first
    pub async fn serve(
        &self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), WorkerError> {
        let Some(store) = &self.store else {
            return Err(WorkerError::NotInitialized(
                "Worker not initialized. Call init() first.".to_string(),
            ));
        };
        let Some(mailer) = &self.mailer else {
            return Err(WorkerError::NotInitialized(
                "Worker not initialized. Call init() first.".to_string(),
            ));
        };

        internal!("Delivery worker starting");

        let mut poll_timer = tokio::time::interval(Duration::from_secs(self.poll_interval_secs));

        loop {
            tokio::select! {
                _ = poll_timer.tick() => {
                    match self.drain(store, mailer).await {
                        Ok(0) => {
                            debug!("Polled queue, no claimable jobs");
                        }
                        Ok(count) => {
                            debug!(count, "Processed claimable jobs");
                        }
                        Err(e) => {
                            error!("Error draining job queue: {e}");
                        }
                    }
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown | Signal::Finalised) => {
                            internal!("Delivery worker received shutdown signal");
                            break;
                        }
                        Err(e) => {
                            error!("Delivery worker shutdown channel error: {e}");
                            break;
                        }
                    }
                }
            }
        }

        internal!("Delivery worker shutdown complete");

        Ok(())
    }

    /// Claim and deliver every currently-eligible job, up to
    /// `max_concurrent` in flight at once
    ///
    /// Jobs requeued with no retry delay (or one that has already elapsed)
    /// are picked up again within the same drain, so a failing job moves
    /// through its retry cycle without waiting for the next tick.
    async fn drain(
        &self,
        store: &Arc<dyn JobStore>,
        mailer: &Arc<dyn Mailer>,
    ) -> missive_queue::Result<usize> {
        let mut join_set: JoinSet<()> = JoinSet::new();
        let mut processed = 0usize;

        loop {
            while join_set.len() < self.max_concurrent {
                let Some(job) = store.claim_next().await? else {
                    break;
                };

                processed += 1;
                let store = Arc::clone(store);
                let mailer = Arc::clone(mailer);
                let retry = self.retry.clone();

                join_set.spawn(async move {
                    process_job(&store, &mailer, &retry, job).await;
                });
            }

            if join_set.join_next().await.is_none() {
                break;
            }
        }

        Ok(processed)
    }
}

/// Deliver a single claimed job and record the outcome
///
/// Delivery errors stop here: they are logged and written to the job, never
/// surfaced to the producer that enqueued it.
async fn process_job(
    store: &Arc<dyn JobStore>,
    mailer: &Arc<dyn Mailer>,
    retry: &RetryPolicy,
    job: EmailJob,
) {
    match mailer.send(&job.recipient, &job.subject, &job.html).await {
        Ok(message_id) => {
            info!(
                job_id = %job.id,
                recipient = %job.recipient,
                message_id = %message_id,
                "Delivered"
            );

            if let Err(e) = store.mark_sent(&job.id).await {
                error!(
                    job_id = %job.id,
                    error = %e,
                    "Failed to record successful delivery"
                );
            }
        }
        Err(e) => {
            // This is the attempt number that just failed (1-indexed)
            let attempt = job.attempts + 1;
            let next_retry_at = retry
                .should_retry(attempt)
                .then(|| retry.calculate_next_retry(attempt));

            warn!(
                job_id = %job.id,
                recipient = %job.recipient,
                attempt,
                error = %e,
                "Delivery failed"
            );

            match store
                .mark_failed(&job.id, &e.to_string(), retry.max_attempts, next_retry_at)
                .await
            {
                Ok(JobStatus::Failed(_)) => {
                    error!(
                        job_id = %job.id,
                        recipient = %job.recipient,
                        attempts = attempt,
                        "Job failed permanently, attempt ceiling reached"
                    );
                }
                Ok(_) => {
                    debug!(
                        job_id = %job.id,
                        next_retry_at = ?next_retry_at,
                        "Scheduled retry"
                    );
                }
                Err(e) => {
                    error!(
                        job_id = %job.id,
                        error = %e,
                        "Failed to record delivery failure"
                    );
                }
            }
        }
    }
}
