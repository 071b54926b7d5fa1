//! The authenticated batch-send surface
//!
//! Transport-independent: an HTTP handler (or anything else) extracts the
//! bearer credential and the request body, and this endpoint does the rest.
//! The credential gate runs before any business logic.

use crate::{
    auth::AuthGate,
    error::DispatchError,
    service::DispatchService,
    types::{BatchReceipt, SendRequest},
};

/// Credential-gated wrapper around [`DispatchService`]
#[derive(Debug, Clone)]
pub struct BatchSendEndpoint {
    auth: AuthGate,
    service: DispatchService,
}

impl BatchSendEndpoint {
    #[must_use]
    pub const fn new(auth: AuthGate, service: DispatchService) -> Self {
        Self { auth, service }
    }

    /// Submit a batch for dispatch
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Unauthenticated`] when the credential is missing
    ///   or invalid; no jobs are created
    /// - Everything [`DispatchService::send_batch`] can return
    pub async fn submit(
        &self,
        credential: Option<&str>,
        request: &SendRequest,
    ) -> Result<BatchReceipt, DispatchError> {
        self.auth.verify(credential)?;

        self.service.send_batch(request).await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use missive_queue::TestJobStore;

    use super::*;
    use crate::{error::AuthError, types::Recipient};

    // Hash of "test-token"
    const TEST_TOKEN_HASH: &str =
        "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031e";

    fn gated_endpoint(store: &TestJobStore) -> BatchSendEndpoint {
        BatchSendEndpoint::new(
            AuthGate {
                enabled: true,
                token_hashes: vec![TEST_TOKEN_HASH.to_string()],
            },
            DispatchService::new(Arc::new(store.clone())),
        )
    }

    fn request() -> SendRequest {
        SendRequest {
            subject: "Test Subject".to_string(),
            body: Some("Test body".to_string()),
            recipients: vec![Recipient {
                email: "test@example.com".to_string(),
                first_name: "John".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_dispatch() {
        let store = TestJobStore::new();
        let endpoint = gated_endpoint(&store);

        let result = endpoint.submit(None, &request()).await;

        assert!(matches!(
            result,
            Err(DispatchError::Unauthenticated(AuthError::MissingCredential))
        ));
        assert_eq!(store.job_count(), 0, "rejected before any job is created");
    }

    #[tokio::test]
    async fn test_invalid_credential_blocks_dispatch() {
        let store = TestJobStore::new();
        let endpoint = gated_endpoint(&store);

        let result = endpoint.submit(Some("invalid_token"), &request()).await;

        assert!(matches!(
            result,
            Err(DispatchError::Unauthenticated(AuthError::InvalidCredential))
        ));
        assert_eq!(store.job_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_credential_dispatches() {
        let store = TestJobStore::new();
        let endpoint = gated_endpoint(&store);

        let receipt = endpoint
            .submit(Some("test-token"), &request())
            .await
            .expect("valid credential should pass the gate");

        assert_eq!(receipt.accepted, 1);
        assert_eq!(store.job_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_gate_allows_anonymous_dispatch() {
        let store = TestJobStore::new();
        let endpoint = BatchSendEndpoint::new(
            AuthGate::default(),
            DispatchService::new(Arc::new(store.clone())),
        );

        let receipt = endpoint
            .submit(None, &request())
            .await
            .expect("disabled gate should allow all");

        assert_eq!(receipt.accepted, 1);
    }
}
