//! Caller-visible errors for the batch-send surface.

use missive_queue::QueueError;
use thiserror::Error;

/// Credential verification failures.
///
/// The two cases are deliberately distinct so callers can tell "you forgot
/// the credential" apart from "your credential is wrong".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("authentication required but no credential provided")]
    MissingCredential,

    /// The presented credential did not match any configured token.
    #[error("invalid credential")]
    InvalidCredential,
}

/// Errors surfaced to the caller of the batch-send surface.
///
/// Everything downstream of a successful enqueue is asynchronous and never
/// reported here; acceptance of the batch is the only caller-visible signal.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed or missing batch fields; no jobs were created.
    #[error("invalid batch request: {0}")]
    Validation(String),

    /// The caller never made it past the credential gate; no business logic
    /// ran.
    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    /// The queue refused an enqueue partway through the batch. Jobs accepted
    /// before the fault remain queued (best-effort semantics); `accepted`
    /// reports how many.
    #[error("failed to enqueue batch after {accepted} accepted jobs: {source}")]
    Queue {
        accepted: usize,
        source: QueueError,
    },
}
