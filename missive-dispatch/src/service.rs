//! Batch validation and enqueueing
//!
//! The producing half of the dispatch pipeline: validate the whole batch up
//! front, personalise each recipient's body, put one job on the queue per
//! recipient, and return as soon as the last enqueue lands. Delivery happens
//! elsewhere, later.

use std::sync::Arc;

use missive_queue::{JobPayload, JobStore};
use tracing::{debug, info};

use crate::{
    error::DispatchError,
    template,
    types::{BatchReceipt, SendRequest},
};

/// Public entry point for batch email dispatch
///
/// Holds the queue it produces into; construct one per store (dependency
/// injection, no process-wide queue).
#[derive(Debug, Clone)]
pub struct DispatchService {
    store: Arc<dyn JobStore>,
}

impl DispatchService {
    #[must_use]
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Validate a batch and enqueue one job per recipient
    ///
    /// Recipients are processed in input order; enqueue order matches, but
    /// that is a queue-position guarantee, not a delivery-order one.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Validation`] before any job is created when the
    ///   subject is empty, the recipient list is empty, or a recipient email
    ///   is empty
    /// - [`DispatchError::Queue`] when the store refuses an enqueue; jobs
    ///   accepted before the fault stay queued and are counted in the error
    pub async fn send_batch(&self, request: &SendRequest) -> Result<BatchReceipt, DispatchError> {
        validate(request)?;

        let mut accepted = 0;

        for recipient in &request.recipients {
            let html = request.body.as_deref().map_or_else(
                || template::render(&recipient.first_name),
                |body| template::personalise(body, &recipient.first_name),
            );

            let payload = JobPayload {
                recipient: recipient.email.clone(),
                subject: request.subject.clone(),
                html,
            };

            match self.store.enqueue(payload).await {
                Ok(id) => {
                    accepted += 1;
                    debug!(
                        job_id = %id,
                        recipient = %recipient.email,
                        "Enqueued email job"
                    );
                }
                Err(source) => {
                    return Err(DispatchError::Queue { accepted, source });
                }
            }
        }

        info!(accepted, subject = %request.subject, "Batch accepted");

        Ok(BatchReceipt { accepted })
    }
}

/// Fail-fast batch validation; runs before any job is created
fn validate(request: &SendRequest) -> Result<(), DispatchError> {
    if request.subject.trim().is_empty() {
        return Err(DispatchError::Validation(
            "subject must not be empty".to_string(),
        ));
    }

    if request.recipients.is_empty() {
        return Err(DispatchError::Validation(
            "recipients must not be empty".to_string(),
        ));
    }

    if let Some(recipient) = request
        .recipients
        .iter()
        .find(|recipient| recipient.email.trim().is_empty())
    {
        return Err(DispatchError::Validation(format!(
            "recipient {:?} has an empty email address",
            recipient.first_name
        )));
    }

    Ok(())
}
