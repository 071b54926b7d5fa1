//! Retry policy for failed deliveries.
//!
//! Encapsulates the attempt ceiling and the exponential-backoff schedule so
//! retry behavior can be tested independently of the worker loop.

use std::time::{Duration, SystemTime};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy configuration for delivery attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of delivery attempts before a job is marked failed.
    ///
    /// Default: 3 attempts
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (in seconds).
    ///
    /// The actual delay is calculated as: `base * 2^(attempt - 1)`
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::base_retry_delay_secs")]
    pub base_retry_delay_secs: u64,

    /// Maximum retry delay (in seconds).
    ///
    /// Caps the exponential backoff to prevent excessively long delays.
    ///
    /// Default: 3600 seconds (1 hour)
    #[serde(default = "defaults::max_retry_delay_secs")]
    pub max_retry_delay_secs: u64,

    /// Jitter factor for randomizing retry delays.
    ///
    /// Jitter prevents thundering herd problems when many jobs retry
    /// simultaneously. The delay is randomized within ±`jitter_factor`.
    ///
    /// Default: 0.1 (±10%)
    #[serde(default = "defaults::retry_jitter_factor")]
    pub retry_jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_retry_delay_secs: defaults::base_retry_delay_secs(),
            max_retry_delay_secs: defaults::max_retry_delay_secs(),
            retry_jitter_factor: defaults::retry_jitter_factor(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy with no delay between attempts, for tests that drive a job
    /// through its full retry cycle without waiting.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_retry_delay_secs: 0,
            max_retry_delay_secs: 0,
            retry_jitter_factor: 0.0,
        }
    }

    /// Check if another attempt is allowed after `attempt_count` attempts.
    #[must_use]
    pub const fn should_retry(&self, attempt_count: u32) -> bool {
        attempt_count < self.max_attempts
    }

    /// Calculate when the next retry should occur.
    ///
    /// # Arguments
    /// * `attempt` - The attempt number that just failed (1-indexed)
    #[must_use]
    pub fn calculate_next_retry(&self, attempt: u32) -> SystemTime {
        calculate_next_retry_time(
            attempt,
            self.base_retry_delay_secs,
            self.max_retry_delay_secs,
            self.retry_jitter_factor,
        )
    }
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        3
    }

    pub const fn base_retry_delay_secs() -> u64 {
        30
    }

    pub const fn max_retry_delay_secs() -> u64 {
        3600 // 1 hour
    }

    pub const fn retry_jitter_factor() -> f64 {
        0.1 // ±10%
    }
}

/// Calculate the next retry time using exponential backoff with jitter
///
/// # Formula
/// `delay = min(base * 2^(attempt - 1), max_delay) * (1 ± jitter)`
///
/// # Arguments
/// * `attempt` - The attempt number (1-indexed)
/// * `base_delay_secs` - Base delay in seconds
/// * `max_delay_secs` - Maximum delay in seconds
/// * `jitter_factor` - Jitter factor (e.g., 0.1 for ±10%)
pub fn calculate_next_retry_time(
    attempt: u32,
    base_delay_secs: u64,
    max_delay_secs: u64,
    jitter_factor: f64,
) -> SystemTime {
    // Exponential backoff: base * 2^(attempt - 1), saturating to avoid
    // overflow on absurd attempt numbers
    let exponent = attempt.saturating_sub(1);
    let delay = if exponent >= 63 {
        max_delay_secs
    } else {
        let multiplier = 1u64 << exponent; // 2^exponent
        base_delay_secs
            .saturating_mul(multiplier)
            .min(max_delay_secs)
    };

    // Apply jitter: delay * (1 ± jitter_factor)
    // Intentional precision loss and casting for randomization
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let jittered_delay = {
        let jitter_range = (delay as f64) * jitter_factor;
        if jitter_range > 0.0 {
            let mut rng = rand::rng();
            let jitter: f64 = rng.random_range(-jitter_range..=jitter_range);
            ((delay as f64) + jitter).max(0.0) as u64
        } else {
            delay
        }
    };

    SystemTime::now() + Duration::from_secs(jittered_delay)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_retry_delay_secs, 30);
        assert_eq!(policy.max_retry_delay_secs, 3600);
        assert!((policy.retry_jitter_factor - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));

        // Should not retry at or past the ceiling
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(100));
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        // jitter=0 for predictable results
        let base_delay = 60;
        let max_delay = 86400;

        // Attempt 1: 60 * 2^0 = 60 seconds
        let now = SystemTime::now();
        let next = calculate_next_retry_time(1, base_delay, max_delay, 0.0);
        let delay = next.duration_since(now).unwrap_or_default().as_secs();
        assert_eq!(delay, 60, "first retry should be 60 seconds");

        // Attempt 2: 60 * 2^1 = 120 seconds
        let now = SystemTime::now();
        let next = calculate_next_retry_time(2, base_delay, max_delay, 0.0);
        let delay = next.duration_since(now).unwrap_or_default().as_secs();
        assert_eq!(delay, 120, "second retry should be 120 seconds");

        // Attempt 3: 60 * 2^2 = 240 seconds
        let now = SystemTime::now();
        let next = calculate_next_retry_time(3, base_delay, max_delay, 0.0);
        let delay = next.duration_since(now).unwrap_or_default().as_secs();
        assert_eq!(delay, 240, "third retry should be 240 seconds");

        // Attempt 20: capped at max_delay
        let now = SystemTime::now();
        let next = calculate_next_retry_time(20, base_delay, max_delay, 0.0);
        let delay = next.duration_since(now).unwrap_or_default().as_secs();
        assert_eq!(delay, max_delay, "high attempt number should be capped");
    }

    #[test]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    fn test_exponential_backoff_with_jitter() {
        let jitter_factor = 0.2; // ±20%

        // Attempt 2: expected 120 seconds, with ±20% jitter = 96-144 seconds
        let now = SystemTime::now();
        let next = calculate_next_retry_time(2, 60, 86400, jitter_factor);
        let delay = next.duration_since(now).unwrap_or_default().as_secs();

        let expected = 120;
        let min = expected - (expected as f64 * jitter_factor) as u64;
        let max = expected + (expected as f64 * jitter_factor) as u64;
        assert!(
            delay >= min && delay <= max,
            "delay {delay} should be within jitter range [{min}, {max}]"
        );
    }

    #[test]
    fn test_immediate_policy() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.max_attempts, 3);

        let now = SystemTime::now();
        let next = policy.calculate_next_retry(1);
        let delay = next.duration_since(now).unwrap_or_default().as_secs();
        assert_eq!(delay, 0);
    }
}
