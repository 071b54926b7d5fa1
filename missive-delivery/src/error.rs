//! Typed error handling for delivery operations.

use thiserror::Error;

/// A failure reported by the mail transport.
///
/// These errors never reach the producer that enqueued the job; each one is
/// recorded on the job and drives the retry/terminal-failure transition.
#[derive(Debug, Error)]
pub enum MailError {
    /// Failed to reach the mail provider.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The provider did not respond in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The provider rejected the message.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// The provider rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Errors raised by the worker's own lifecycle.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker was started without a store or mailer.
    #[error("worker not initialised: {0}")]
    NotInitialized(String),
}
