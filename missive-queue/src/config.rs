use std::sync::Arc;

use serde::Deserialize;

use crate::{backends::MemoryJobStore, store::JobStore};

/// Configuration for the queue backing store
///
/// Allows runtime selection of the store implementation through
/// configuration files.
///
/// # Examples
///
/// Unbounded in-memory queue in RON config:
/// ```ron
/// queue: Memory(()),
/// ```
///
/// With a capacity limit:
/// ```ron
/// queue: Memory((
///     capacity: Some(10000),
/// )),
/// ```
#[derive(Debug, Clone, Deserialize)]
pub enum QueueConfig {
    /// In-memory queue
    ///
    /// Can optionally specify a capacity limit to prevent unbounded memory
    /// growth.
    Memory(MemoryConfig),
}

/// Configuration for the in-memory store
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemoryConfig {
    /// Maximum number of jobs to hold (omit for unlimited)
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::Memory(MemoryConfig::default())
    }
}

impl QueueConfig {
    /// Convert the configuration into a concrete job store
    ///
    /// This consumes the config and returns an Arc'd trait object that can
    /// be shared between producers and workers.
    #[must_use]
    pub fn into_store(self) -> Arc<dyn JobStore> {
        match self {
            Self::Memory(config) => config.capacity.map_or_else(
                || Arc::new(MemoryJobStore::new()),
                |capacity| Arc::new(MemoryJobStore::with_capacity(capacity)),
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded_memory() {
        let QueueConfig::Memory(config) = QueueConfig::default();
        assert!(config.capacity.is_none());
    }

    #[tokio::test]
    async fn test_into_store_respects_capacity() {
        let store = QueueConfig::Memory(MemoryConfig { capacity: Some(1) }).into_store();

        store
            .enqueue(crate::JobPayload {
                recipient: "a@x.com".to_string(),
                subject: "Hi".to_string(),
                html: "<p>Hi</p>".to_string(),
            })
            .await
            .expect("first enqueue fits");

        let result = store
            .enqueue(crate::JobPayload {
                recipient: "b@x.com".to_string(),
                subject: "Hi".to_string(),
                html: "<p>Hi</p>".to_string(),
            })
            .await;
        assert!(result.is_err());
    }
}
