//! The transport seam between the worker and the outside world.
//!
//! The actual mail provider is a black box behind the [`Mailer`] trait; the
//! worker only ever sees `send -> Result<MessageId, MailError>`.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::info;

use crate::error::MailError;

/// Provider-assigned identifier for an accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(String);

impl MessageId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for handing a rendered message to a mail transport
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    /// Deliver a message
    ///
    /// # Errors
    /// If the transport cannot deliver the message
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<MessageId, MailError>;
}

/// Adapter that logs deliveries instead of handing them to a transport
///
/// Useful for development deployments where no provider is wired up; every
/// send "succeeds" with a fabricated message ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<MessageId, MailError> {
        let id = MessageId::new(ulid::Ulid::new().to_string());
        info!(
            message_id = %id,
            to = %to,
            subject = %subject,
            bytes = html.len(),
            "delivery (log transport)"
        );
        Ok(id)
    }
}

/// A message recorded by [`MockMailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mock transport for testing
///
/// Records every successful send and can be told to fail the next N send
/// calls, which is how tests drive jobs through their retry cycle.
#[derive(Debug, Clone, Default)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    attempts: Arc<AtomicU32>,
    /// Remaining send calls to fail (`u32::MAX` = fail forever)
    failures: Arc<AtomicU32>,
    notify: Arc<Notify>,
}

impl MockMailer {
    /// Create a new mock transport that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` send calls with a connection error
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Fail every send call from now on
    pub fn fail_always(&self) {
        self.failures.store(u32::MAX, Ordering::SeqCst);
    }

    /// Total send calls observed, successful or not
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Get all successfully sent messages
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .expect("MockMailer sent mutex poisoned")
            .clone()
    }

    /// Get the number of successfully sent messages
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .expect("MockMailer sent mutex poisoned")
            .len()
    }

    /// Wait for a specific number of successful sends, with timeout
    ///
    /// This is useful in tests to ensure worker processing completes before
    /// assertions.
    ///
    /// # Errors
    /// Returns an error if the timeout is reached before the expected count
    pub async fn wait_for_count(
        &self,
        expected: usize,
        timeout: std::time::Duration,
    ) -> anyhow::Result<()> {
        tokio::time::timeout(timeout, async {
            loop {
                if self.sent_count() >= expected {
                    return;
                }
                self.notify.notified().await;
            }
        })
        .await?;
        Ok(())
    }

    /// Wait for a total number of send attempts (including failures), with
    /// timeout
    ///
    /// # Errors
    /// Returns an error if the timeout is reached before the expected count
    pub async fn wait_for_attempts(
        &self,
        expected: u32,
        timeout: std::time::Duration,
    ) -> anyhow::Result<()> {
        tokio::time::timeout(timeout, async {
            loop {
                if self.attempt_count() >= expected {
                    return;
                }
                self.notify.notified().await;
            }
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for MockMailer {
    #[allow(clippy::expect_used)]
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<MessageId, MailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.failures.store(remaining - 1, Ordering::SeqCst);
            }
            self.notify.notify_waiters();
            return Err(MailError::Connection(
                "simulated connection failure".to_string(),
            ));
        }

        let id = MessageId::new(ulid::Ulid::new().to_string());
        self.sent
            .lock()
            .expect("MockMailer sent mutex poisoned")
            .push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                html: html.to_string(),
            });
        self.notify.notify_waiters();

        Ok(id)
    }
}

/// Configuration for the mail transport adapter
///
/// ```ron
/// mailer: Log,
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub enum MailerConfig {
    /// Log-only transport (no provider wired up)
    #[default]
    Log,
}

impl MailerConfig {
    /// Convert the configuration into a concrete mailer
    #[must_use]
    pub fn into_mailer(self) -> Arc<dyn Mailer> {
        match self {
            Self::Log => Arc::new(LogMailer),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_mailer_records_sends() {
        let mailer = MockMailer::new();

        mailer
            .send("test@example.com", "Test", "<h1>Test</h1>")
            .await
            .expect("send should succeed");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "test@example.com");
        assert_eq!(sent[0].subject, "Test");
        assert_eq!(sent[0].html, "<h1>Test</h1>");
    }

    #[tokio::test]
    async fn test_mock_mailer_failure_budget() {
        let mailer = MockMailer::new();
        mailer.fail_next(2);

        assert!(mailer.send("a@x.com", "s", "h").await.is_err());
        assert!(mailer.send("a@x.com", "s", "h").await.is_err());
        assert!(mailer.send("a@x.com", "s", "h").await.is_ok());

        assert_eq!(mailer.attempt_count(), 3);
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer;
        let id = mailer
            .send("test@example.com", "Test", "<h1>Test</h1>")
            .await
            .expect("log transport should accept everything");
        assert!(!id.as_str().is_empty());
    }
}
