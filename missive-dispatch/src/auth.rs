//! Credential gate for the batch-send surface
//!
//! Provides token-based authentication using SHA-256 hashed bearer tokens.
//! Tokens are hashed before storage in configuration to prevent token
//! leakage. Issuing credentials (password hashing, JWT minting) is someone
//! else's job; this gate only answers "may this caller dispatch email?".

use hex::encode;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Authentication configuration for the batch-send surface
///
/// When enabled, every submission must include a valid bearer token that
/// matches one of the configured token hashes. When disabled, all requests
/// are allowed (deployment-local trust).
///
/// # Example Configuration
///
/// ```ron
/// auth: (
///     enabled: true,
///     token_hashes: [
///         // SHA-256 hash of "admin-token-12345"
///         "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8",
///     ],
/// )
/// ```
///
/// # Generating Token Hashes
///
/// ```bash
/// echo -n "your-secret-token" | sha256sum
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthGate {
    /// Enable or disable authentication
    #[serde(default)]
    pub enabled: bool,

    /// Valid bearer tokens (SHA-256 hashes)
    ///
    /// Each hash is a 64-character hex string. Incoming tokens are hashed
    /// and compared against this list.
    #[serde(default)]
    pub token_hashes: Vec<String>,
}

impl AuthGate {
    /// Check if authentication is required
    #[must_use]
    pub const fn requires_auth(&self) -> bool {
        self.enabled
    }

    /// Validate a bearer token against configured hashes
    ///
    /// Returns `true` when authentication is disabled, or when the token's
    /// hash matches one of the configured hashes.
    ///
    /// # Example
    ///
    /// ```
    /// # use missive_dispatch::AuthGate;
    /// let gate = AuthGate {
    ///     enabled: true,
    ///     token_hashes: vec![
    ///         // Hash of "test-token"
    ///         "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031e".to_string(),
    ///     ],
    /// };
    ///
    /// assert!(gate.validate_token("test-token"));
    /// assert!(!gate.validate_token("wrong-token"));
    /// ```
    #[must_use]
    pub fn validate_token(&self, token: &str) -> bool {
        if !self.enabled {
            return true; // Auth disabled, allow all
        }

        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let hash = encode(hasher.finalize());

        self.token_hashes.iter().any(|h| h == &hash)
    }

    /// Verify an optional credential
    ///
    /// This is the inbound gate: a rejection here means no business logic
    /// runs and no jobs are created.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingCredential`] when authentication is enabled but
    ///   no credential was presented
    /// - [`AuthError::InvalidCredential`] when the credential does not match
    ///
    /// # Example
    ///
    /// ```
    /// # use missive_dispatch::AuthGate;
    /// let gate = AuthGate {
    ///     enabled: true,
    ///     token_hashes: vec![
    ///         // Hash of "test-token"
    ///         "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031e".to_string(),
    ///     ],
    /// };
    ///
    /// assert!(gate.verify(Some("test-token")).is_ok());
    /// assert!(gate.verify(None).is_err());
    /// assert!(gate.verify(Some("wrong-token")).is_err());
    /// ```
    pub fn verify(&self, credential: Option<&str>) -> Result<(), AuthError> {
        if !self.enabled {
            return Ok(()); // Auth disabled, allow all
        }

        match credential {
            None => Err(AuthError::MissingCredential),
            Some(token) => {
                if self.validate_token(token) {
                    Ok(())
                } else {
                    Err(AuthError::InvalidCredential)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that authentication can be disabled
    #[test]
    fn test_auth_disabled() {
        let gate = AuthGate {
            enabled: false,
            token_hashes: Vec::new(),
        };

        assert!(!gate.requires_auth());
        assert!(gate.validate_token("any-token"));
        assert!(gate.validate_token(""));
        assert!(gate.verify(None).is_ok());
    }

    /// Test that authentication can be enabled with valid tokens
    #[test]
    fn test_auth_enabled_valid_token() {
        let gate = AuthGate {
            enabled: true,
            token_hashes: vec![
                // Hash of "test-token"
                "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031e".to_string(),
                // Hash of "another-token"
                "9e78bcb94091b75109fd6773524fc8d6a4f8a6dfb3dae39a9c26c5001879bcf3".to_string(),
            ],
        };

        assert!(gate.requires_auth());
        assert!(gate.validate_token("test-token"));
        assert!(gate.validate_token("another-token"));
        assert!(gate.verify(Some("test-token")).is_ok());
    }

    /// Test that authentication rejects invalid tokens
    #[test]
    fn test_auth_enabled_invalid_token() {
        let gate = AuthGate {
            enabled: true,
            token_hashes: vec![
                // Hash of "test-token"
                "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031e".to_string(),
            ],
        };

        assert!(!gate.validate_token("wrong-token"));
        assert!(!gate.validate_token(""));
        assert!(!gate.validate_token("test-token-modified"));
        assert_eq!(
            gate.verify(Some("wrong-token")),
            Err(AuthError::InvalidCredential)
        );
    }

    /// Test that a missing credential is distinct from a wrong one
    #[test]
    fn test_auth_enabled_no_token() {
        let gate = AuthGate {
            enabled: true,
            token_hashes: vec![
                // Hash of "test-token"
                "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031e".to_string(),
            ],
        };

        assert_eq!(gate.verify(None), Err(AuthError::MissingCredential));
    }

    /// Test that empty token list rejects all tokens
    #[test]
    fn test_auth_enabled_empty_token_list() {
        let gate = AuthGate {
            enabled: true,
            token_hashes: Vec::new(),
        };

        assert!(!gate.validate_token("any-token"));
        assert!(gate.verify(Some("any-token")).is_err());
    }

    /// Test that SHA-256 hashing is deterministic
    #[test]
    fn test_hash_deterministic() {
        let gate = AuthGate {
            enabled: true,
            token_hashes: vec![
                // Hash of "consistent-token"
                "4c7d2efece9175af9dff6b77a4b452d0ab42a2f424cdb97f3016525c8c754657".to_string(),
            ],
        };

        assert!(gate.validate_token("consistent-token"));
        assert!(gate.validate_token("consistent-token"));
        assert!(gate.validate_token("consistent-token"));
    }

    /// Test Default implementation
    #[test]
    fn test_default() {
        let gate = AuthGate::default();
        assert!(!gate.enabled);
        assert!(gate.token_hashes.is_empty());
        assert!(!gate.requires_auth());
    }
}
