//! Authentication primitives: login credentials, roles, permissions, and the
//! identity attached to authenticated requests.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::wire_enum::wire_enum;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is trimmed, lower-cased, and non-empty.
/// - `password` is non-empty but retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use marketplace::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Admin@Example.com ", "password").unwrap();
/// assert_eq!(creds.email(), "admin@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for account lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}


wire_enum! {
    /// Back-office role. `SuperAdmin` bypasses permission checks.
    pub enum Role ("role") {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Manager => "manager",
        Viewer => "viewer",
    }
}

impl Role {
    /// Whether a holder of `self` may assign `other` or manage an account
    /// holding it. Variants run from most to least privileged.
    pub fn may_assign(self, other: Self) -> bool {
        self <= other
    }
}

wire_enum! {
    /// Fine-grained capability granted to an account.
    pub enum Permission ("permission") {
        ManageBikes => "manage_bikes",
        ManagePartners => "manage_partners",
        ManageCosts => "manage_costs",
        ManageTransactions => "manage_transactions",
        ManageReviews => "manage_reviews",
        ManageAccounts => "manage_accounts",
        ViewDashboard => "view_dashboard",
    }
}

/// Resolved caller identity attached to authenticated requests.
///
/// # Examples
/// ```
/// use marketplace::domain::{Identity, Permission, Role};
/// use uuid::Uuid;
///
/// let identity = Identity::new(Uuid::nil(), "root@example.com", Role::SuperAdmin, []);
/// assert!(identity.has_permission(Permission::ManageAccounts));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    subject_id: Uuid,
    email: String,
    role: Role,
    permissions: BTreeSet<Permission>,
}

impl Identity {
    /// Build an identity.
    pub fn new(
        subject_id: Uuid,
        email: impl Into<String>,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            subject_id,
            email: email.into(),
            role,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Whether the identity may exercise `permission`.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role == Role::SuperAdmin || self.permissions.contains(&permission)
    }

    /// Whether the identity's role appears in `allowed`.
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Claims embedded in a signed credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaims {
    pub subject: Uuid,
    pub email: String,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CredentialClaims {
    /// Identity described by the claims.
    pub fn identity(&self) -> Identity {
        Identity::new(
            self.subject,
            self.email.clone(),
            self.role,
            self.permissions.iter().copied(),
        )
    }
}
