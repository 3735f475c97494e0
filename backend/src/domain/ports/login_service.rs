//! Driving port for login/authentication use-cases.
//!
//! In hexagonal terms this is a *driving* port: inbound adapters call it to
//! authenticate credentials without knowing (or importing) the backing
//! infrastructure. HTTP handler tests substitute a test double instead of
//! wiring a store and a hasher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AccountView, Error, LoginCredentials};

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: AccountView,
}

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and issue a signed credential.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<LoginSession, Error>;
}
