//! Caller identification for protected operations.
//!
//! Per request the gate moves through a small state machine:
//!
//! ```text
//! NoCredential ──▶ Rejected | Anonymous
//! CredentialPresent ──▶ verify ──▶ Rejected | lookup ──▶ Rejected | Authorized
//! ```
//!
//! `Required` mode rejects on every failure. `Optional` mode never rejects:
//! any failure degrades to an anonymous caller. Account status is read from
//! the store on every authenticated call so deactivation revokes credentials
//! that have not yet expired.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::domain::ports::{DocumentStore, TokenService};
use crate::domain::repository::Repository;
use crate::domain::{Account, Error, Identity, Permission, Role};

/// Whether a missing or bad credential stops the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Required,
    Optional,
}

/// Why the gate rejected a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NoCredential,
    InvalidCredential,
    AccountInactive,
    InsufficientPermission,
    InsufficientRole,
}

impl AuthFailure {
    /// Client-facing message.
    pub fn message(self) -> &'static str {
        match self {
            Self::NoCredential => "Access denied. No token provided.",
            Self::InvalidCredential => "Invalid or expired token.",
            Self::AccountInactive => "Account is inactive or no longer exists.",
            Self::InsufficientPermission => "Insufficient permissions.",
            Self::InsufficientRole => "Insufficient role.",
        }
    }

    /// Machine-readable reason carried in error details.
    pub fn reason(self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::AccountInactive => "account_inactive",
            Self::InsufficientPermission => "insufficient_permission",
            Self::InsufficientRole => "insufficient_role",
        }
    }
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        let error = match failure {
            AuthFailure::NoCredential
            | AuthFailure::InvalidCredential
            | AuthFailure::AccountInactive => Error::unauthorized(failure.message()),
            AuthFailure::InsufficientPermission | AuthFailure::InsufficientRole => {
                Error::forbidden(failure.message())
            }
        };
        error.with_details(json!({ "reason": failure.reason() }))
    }
}

/// Terminal non-rejected gate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Authorized(Identity),
    Anonymous,
}

impl GateOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authorized(identity) => Some(identity),
            Self::Anonymous => None,
        }
    }
}

/// Credential candidates in priority order: primary cookie, legacy cookie,
/// then the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialSources<'a> {
    pub primary_cookie: Option<&'a str>,
    pub legacy_cookie: Option<&'a str>,
    pub authorization_header: Option<&'a str>,
}

impl<'a> CredentialSources<'a> {
    /// First present credential. Blank values count as absent.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::CredentialSources;
    ///
    /// let sources = CredentialSources {
    ///     primary_cookie: None,
    ///     legacy_cookie: Some("legacy"),
    ///     authorization_header: Some("Bearer header"),
    /// };
    /// assert_eq!(sources.credential(), Some("legacy"));
    /// ```
    pub fn credential(&self) -> Option<&'a str> {
        let bearer = self.authorization_header.and_then(|header| {
            let (scheme, token) = header.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        });
        [self.primary_cookie, self.legacy_cookie, bearer]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
    }
}

/// Post-authentication refinement applied by a subset of routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    permission: Option<Permission>,
    roles: Option<Vec<Role>>,
}

impl AccessPolicy {
    /// Policy admitting any authenticated caller.
    pub fn any() -> Self {
        Self::default()
    }

    /// Require `permission`. `super_admin` bypasses this check.
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Restrict to callers whose role is in `roles`.
    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    /// Check `identity` against the policy.
    pub fn authorize(&self, identity: &Identity) -> Result<(), AuthFailure> {
        if let Some(permission) = self.permission {
            if !identity.has_permission(permission) {
                return Err(AuthFailure::InsufficientPermission);
            }
        }
        if let Some(roles) = &self.roles {
            if !identity.has_role(roles) {
                return Err(AuthFailure::InsufficientRole);
            }
        }
        Ok(())
    }
}

/// Resolves credentials to identities.
#[derive(Clone)]
pub struct AuthGateService {
    tokens: Arc<dyn TokenService>,
    accounts: Repository<Account>,
}

impl AuthGateService {
    pub fn new(tokens: Arc<dyn TokenService>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            tokens,
            accounts: Repository::new(store),
        }
    }

    /// Run the gate for one request.
    ///
    /// Returns `Err` only in [`AuthMode::Required`], or when the account
    /// lookup itself fails.
    pub async fn resolve(
        &self,
        credential: Option<&str>,
        mode: AuthMode,
        policy: &AccessPolicy,
    ) -> Result<GateOutcome, Error> {
        match self.authenticate(credential).await? {
            Ok(identity) => match policy.authorize(&identity) {
                Ok(()) => Ok(GateOutcome::Authorized(identity)),
                Err(failure) if mode == AuthMode::Required => {
                    debug!(reason = failure.reason(), subject = %identity.subject_id(), "access refused");
                    Err(failure.into())
                }
                Err(_) => Ok(GateOutcome::Anonymous),
            },
            Err(failure) if mode == AuthMode::Required => {
                debug!(reason = failure.reason(), "authentication refused");
                Err(failure.into())
            }
            Err(_) => Ok(GateOutcome::Anonymous),
        }
    }

    async fn authenticate(&self, credential: Option<&str>) -> Result<Result<Identity, AuthFailure>, Error> {
        let Some(token) = credential else {
            return Ok(Err(AuthFailure::NoCredential));
        };
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(error = %err, "credential verification failed");
                return Ok(Err(AuthFailure::InvalidCredential));
            }
        };
        let account = self.accounts.get(claims.subject).await?;
        Ok(match account {
            Some(account) if account.is_active => Ok(claims.identity()),
            _ => Err(AuthFailure::AccountInactive),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorKind;
    use crate::domain::ports::{MockDocumentStore, MockTokenService, TokenError};
    use crate::domain::CredentialClaims;
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    const SUBJECT: Uuid = Uuid::from_u128(0x42);

    fn claims(role: Role, permissions: &[Permission]) -> CredentialClaims {
        let now = Utc::now();
        CredentialClaims {
            subject: SUBJECT,
            email: "ops@example.com".into(),
            role,
            permissions: permissions.iter().copied().collect::<BTreeSet<_>>(),
            issued_at: now,
            expires_at: now + Duration::hours(1),
        }
    }

    fn account_document(active: bool) -> serde_json::Map<String, serde_json::Value> {
        let now = Utc::now().to_rfc3339();
        json!({
            "id": SUBJECT, "email": "ops@example.com", "name": "Ops",
            "passwordHash": "x", "role": "manager", "permissions": [],
            "isActive": active, "createdAt": now, "updatedAt": now
        })
        .as_object()
        .cloned()
        .expect("fixture is an object")
    }

    fn gate(tokens: MockTokenService, store: MockDocumentStore) -> AuthGateService {
        AuthGateService::new(Arc::new(tokens), Arc::new(store))
    }

    fn valid_token(role: Role, permissions: &'static [Permission]) -> MockTokenService {
        let mut tokens = MockTokenService::new();
        tokens
            .expect_verify()
            .returning(move |_| Ok(claims(role, permissions)));
        tokens
    }

    fn store_with(active: Option<bool>) -> MockDocumentStore {
        let mut store = MockDocumentStore::new();
        store
            .expect_find_by_id()
            .times(1)
            .returning(move |_, _| Ok(active.map(account_document)));
        store
    }

    #[rstest]
    #[tokio::test]
    async fn missing_credential_is_rejected_without_store_access() {
        let mut store = MockDocumentStore::new();
        store.expect_find_by_id().never();
        let err = gate(MockTokenService::new(), store)
            .resolve(None, AuthMode::Required, &AccessPolicy::any())
            .await
            .expect_err("no credential");
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "Access denied. No token provided.");
    }

    #[rstest]
    #[case(TokenError::expired())]
    #[case(TokenError::bad_signature())]
    #[case(TokenError::malformed("not a jwt"))]
    #[tokio::test]
    async fn bad_credentials_degrade_in_optional_mode(#[case] failure: TokenError) {
        let mut tokens = MockTokenService::new();
        let for_required = failure.clone();
        tokens
            .expect_verify()
            .times(2)
            .returning(move |_| Err(for_required.clone()));
        let gate = gate(tokens, MockDocumentStore::new());

        let outcome = gate
            .resolve(Some("t"), AuthMode::Optional, &AccessPolicy::any())
            .await
            .expect("optional never fails");
        assert_eq!(outcome, GateOutcome::Anonymous);

        let err = gate
            .resolve(Some("t"), AuthMode::Required, &AccessPolicy::any())
            .await
            .expect_err("required rejects");
        assert_eq!(err.message(), "Invalid or expired token.");
    }

    #[rstest]
    #[case(Some(false))]
    #[case(None)]
    #[tokio::test]
    async fn inactive_or_missing_accounts_are_rejected(#[case] active: Option<bool>) {
        let err = gate(valid_token(Role::Manager, &[]), store_with(active))
            .resolve(Some("t"), AuthMode::Required, &AccessPolicy::any())
            .await
            .expect_err("inactive");
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "Account is inactive or no longer exists.");
    }

    #[rstest]
    #[tokio::test]
    async fn active_account_is_authorized_from_claims() {
        let outcome = gate(
            valid_token(Role::Manager, &[Permission::ManageBikes]),
            store_with(Some(true)),
        )
        .resolve(
            Some("t"),
            AuthMode::Required,
            &AccessPolicy::any().permission(Permission::ManageBikes),
        )
        .await
        .expect("authorized");
        let identity = outcome.identity().expect("identity attached");
        assert_eq!(identity.subject_id(), SUBJECT);
        assert_eq!(identity.role(), Role::Manager);
    }

    #[rstest]
    #[case(Role::Manager, &[], AccessPolicy::any().permission(Permission::ManageCosts), Some("Insufficient permissions."))]
    #[case(Role::SuperAdmin, &[], AccessPolicy::any().permission(Permission::ManageCosts), None)]
    #[case(Role::Manager, &[Permission::ManageAccounts], AccessPolicy::any().permission(Permission::ManageAccounts).roles([Role::SuperAdmin, Role::Admin]), Some("Insufficient role."))]
    #[case(Role::Admin, &[Permission::ManageAccounts], AccessPolicy::any().permission(Permission::ManageAccounts).roles([Role::SuperAdmin, Role::Admin]), None)]
    #[tokio::test]
    async fn policies_refine_authenticated_callers(
        #[case] role: Role,
        #[case] permissions: &'static [Permission],
        #[case] policy: AccessPolicy,
        #[case] expected_message: Option<&str>,
    ) {
        let result = gate(valid_token(role, permissions), store_with(Some(true)))
            .resolve(Some("t"), AuthMode::Required, &policy)
            .await;
        match expected_message {
            None => assert!(result.is_ok()),
            Some(message) => {
                let err = result.expect_err("forbidden");
                assert_eq!(err.kind(), ErrorKind::Authorization);
                assert_eq!(err.message(), message);
            }
        }
    }

    #[rstest]
    #[case(Some("a"), Some("b"), Some("Bearer c"), Some("a"))]
    #[case(None, None, Some("Bearer c"), Some("c"))]
    #[case(None, None, Some("bearer  c "), Some("c"))]
    #[case(Some(""), None, Some("Basic abc"), None)]
    #[case(None, None, None, None)]
    fn credential_sources_follow_priority(
        #[case] primary: Option<&str>,
        #[case] legacy: Option<&str>,
        #[case] header: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let sources = CredentialSources {
            primary_cookie: primary,
            legacy_cookie: legacy,
            authorization_header: header,
        };
        assert_eq!(sources.credential(), expected);
    }
}
