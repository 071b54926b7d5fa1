//! Request and response shapes for the batch-send surface
//!
//! These are the transport-independent DTOs: whatever embeds the endpoint
//! (an HTTP handler, a control socket, a test) deserialises into and out of
//! these.

use serde::{Deserialize, Serialize};

/// One batch recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Email address
    pub email: String,
    /// First name used for personalisation
    #[serde(default)]
    pub first_name: String,
}

/// A batch send request
///
/// Transient: validated and expanded into one job per recipient, never
/// persisted itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    /// Subject applied to every message in the batch
    pub subject: String,
    /// Optional body template; when present, `{{firstName}}` is substituted
    /// per recipient, otherwise the default template is rendered
    #[serde(default)]
    pub body: Option<String>,
    /// Recipients, in order
    pub recipients: Vec<Recipient>,
}

/// Acknowledgement that a batch was accepted
///
/// Acceptance means every job was enqueued; it says nothing about eventual
/// delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Number of jobs enqueued
    pub accepted: usize,
}
