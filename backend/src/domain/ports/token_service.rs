//! Port abstraction for signing and verifying bearer credentials.
//!
//! Credentials are stateless: nothing is persisted when one is issued, and
//! verification only checks the signature and expiry. Account status is
//! checked separately by the auth gate.

use chrono::{DateTime, Utc};

use crate::domain::{CredentialClaims, Identity};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token service adapters.
    pub enum TokenError {
        /// The token is not structurally valid or lacks required claims.
        Malformed { message: String } => "token is malformed: {message}",
        /// The signature does not match the configured secret.
        BadSignature => "token signature is invalid",
        /// The token's expiry has passed.
        Expired => "token has expired",
        /// A token could not be produced.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// A freshly signed credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Port for issuing and verifying signed credentials.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign a credential describing `identity`.
    fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError>;

    /// Verify `token` and return its claims.
    fn verify(&self, token: &str) -> Result<CredentialClaims, TokenError>;
}
