//! Back-office operator accounts.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::Collection;
use crate::domain::repository::Entity;
use crate::domain::{Identity, Permission, Role};

/// Stored operator account.
///
/// `password_hash` is persisted but never leaves the service; responses use
/// [`AccountView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    pub is_active: bool,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Account {
    const COLLECTION: Collection = Collection::new("accounts", &["email"]);
    const LABEL: &'static str = "Account";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Account {
    /// Identity carried in credentials issued for this account.
    pub fn identity(&self) -> Identity {
        Identity::new(
            self.id,
            self.email.clone(),
            self.role,
            self.permissions.iter().copied(),
        )
    }
}

/// Account projection safe to return to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            permissions: account.permissions.clone(),
            is_active: account.is_active,
            last_login_at: account.last_login_at,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update of an account. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<BTreeSet<Permission>>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn view_never_contains_password_hash() {
        let now = Utc::now();
        let account = Account {
            id: Uuid::nil(),
            email: "ops@example.com".into(),
            name: "Ops".into(),
            password_hash: "$2b$04$secret".into(),
            role: Role::Manager,
            permissions: BTreeSet::from([Permission::ManageBikes]),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(AccountView::from(&account)).expect("serialise view");
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["permissions"], json!(["manage_bikes"]));
        assert_eq!(value["isActive"], json!(true));
    }
}
