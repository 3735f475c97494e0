//! Operator account administration and first-run bootstrap.

use std::sync::Arc;

use mockable::Clock;
use pagination::Paginated;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::listing::{ADMIN_PAGE_LIMITS, PageQuery, find_page};
use crate::domain::ports::{DocumentStore, Filter, PasswordHashError, PasswordHasher, SortOrder};
use crate::domain::repository::Repository;
use crate::domain::{
    Account, AccountPatch, AccountView, Error, Identity, NewAccount, Permission, Role,
};

pub(crate) fn map_hash_error(err: PasswordHashError) -> Error {
    error!(error = %err, "password hasher failed");
    Error::internal(err.to_string())
}

fn ensure_may_assign(actor: &Identity, role: Role) -> Result<(), Error> {
    if actor.role().may_assign(role) {
        Ok(())
    } else {
        debug!(subject = %actor.subject_id(), %role, "role above the caller refused");
        Err(Error::forbidden("Cannot manage a role above your own."))
    }
}

/// Credentials for the first super administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Repository<Account>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts: Repository::new(store),
            hasher,
            clock,
        }
    }

    pub async fn list(&self, page: PageQuery) -> Result<Paginated<AccountView>, Error> {
        let request = page.request(ADMIN_PAGE_LIMITS)?;
        let page = find_page(
            &self.accounts,
            &Filter::new(),
            ("createdAt", SortOrder::Desc),
            request,
        )
        .await?;
        Ok(page.map(|account| AccountView::from(&account)))
    }

    pub async fn get(&self, id: Uuid) -> Result<AccountView, Error> {
        let account = self.accounts.require(id).await?;
        Ok(AccountView::from(&account))
    }

    /// Create an account on behalf of `actor`, who may not grant a role
    /// above their own.
    pub async fn create(&self, actor: &Identity, input: NewAccount) -> Result<AccountView, Error> {
        ensure_may_assign(actor, input.role)?;
        self.provision(input).await
    }

    async fn provision(&self, input: NewAccount) -> Result<AccountView, Error> {
        let password_hash = self
            .hasher
            .hash(&input.password)
            .await
            .map_err(map_hash_error)?;
        let now = self.clock.utc();
        let account = Account {
            id: Uuid::new_v4(),
            email: input.email.trim().to_lowercase(),
            name: input.name,
            password_hash,
            role: input.role,
            permissions: input.permissions,
            is_active: input.is_active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(&account).await?;
        info!(account_id = %account.id, role = %account.role, "account created");
        Ok(AccountView::from(&account))
    }

    /// Apply `patch` on behalf of `actor`. A new password is hashed before
    /// storage; deactivation takes effect on the holder's next request.
    ///
    /// `actor` may neither touch an account ranked above their own role nor
    /// raise any account above it.
    pub async fn update(
        &self,
        actor: &Identity,
        id: Uuid,
        patch: AccountPatch,
    ) -> Result<AccountView, Error> {
        let mut account = self.accounts.require(id).await?;
        ensure_may_assign(actor, account.role)?;
        if let Some(role) = patch.role {
            ensure_may_assign(actor, role)?;
        }
        if let Some(password) = patch.password.as_deref() {
            account.password_hash = self.hasher.hash(password).await.map_err(map_hash_error)?;
        }
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(role) = patch.role {
            account.role = role;
        }
        if let Some(permissions) = patch.permissions {
            account.permissions = permissions;
        }
        if let Some(is_active) = patch.is_active {
            account.is_active = is_active;
        }
        account.updated_at = self.clock.utc();
        self.accounts.replace(&account).await?;
        Ok(AccountView::from(&account))
    }

    /// Create a super administrator when no account exists yet.
    ///
    /// Returns the created account, or `None` when accounts already exist.
    pub async fn bootstrap(&self, admin: BootstrapAdmin) -> Result<Option<AccountView>, Error> {
        if self.accounts.count(&Filter::new()).await? > 0 {
            return Ok(None);
        }
        let created = self
            .provision(NewAccount {
                email: admin.email,
                name: admin.name,
                password: admin.password,
                role: Role::SuperAdmin,
                permissions: Permission::ALL.iter().copied().collect(),
                is_active: true,
            })
            .await?;
        info!(account_id = %created.id, "bootstrap super administrator created");
        Ok(Some(created))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorKind;
    use crate::domain::ports::MockPasswordHasher;
    use crate::outbound::persistence::MemoryDocumentStore;
    use crate::test_support::{MutableClock, root_identity};
    use rstest::{fixture, rstest};

    #[fixture]
    fn service() -> AccountService {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|password| Ok(format!("hashed:{}", password.len())));
        AccountService::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(hasher),
            Arc::new(MutableClock::at_test_epoch()),
        )
    }

    fn new_account(email: &str, role: Role) -> NewAccount {
        NewAccount {
            email: email.to_owned(),
            name: "Operator".to_owned(),
            password: "correct horse battery".to_owned(),
            role,
            permissions: [Permission::ManageBikes].into_iter().collect(),
            is_active: true,
        }
    }

    fn admin() -> Identity {
        Identity::new(Uuid::new_v4(), "admin@example.com", Role::Admin, [])
    }

    #[rstest]
    #[tokio::test]
    async fn only_the_hash_is_stored_and_never_returned(service: AccountService) {
        let view = service
            .create(&root_identity(), new_account(" Ops@Example.com ", Role::Manager))
            .await
            .expect("create account");

        let stored = service.accounts.require(view.id).await.expect("stored account");
        assert_eq!(stored.email, "ops@example.com");
        assert_eq!(stored.password_hash, "hashed:21");
        assert_ne!(stored.password_hash, "correct horse battery");

        let body = serde_json::to_value(&view).expect("serialise view");
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("password").is_none());
    }

    #[rstest]
    #[case(Role::SuperAdmin, false)]
    #[case(Role::Admin, true)]
    #[case(Role::Viewer, true)]
    #[tokio::test]
    async fn admins_cannot_create_roles_above_their_own(
        service: AccountService,
        #[case] role: Role,
        #[case] allowed: bool,
    ) {
        let result = service.create(&admin(), new_account("new@example.com", role)).await;

        match result {
            Ok(view) => {
                assert!(allowed, "{role} should have been refused");
                assert_eq!(view.role, role);
            }
            Err(err) => {
                assert!(!allowed, "{role} should have been allowed");
                assert_eq!(err.kind(), ErrorKind::Authorization);
                assert_eq!(service.accounts.count(&Filter::new()).await.expect("count"), 0);
            }
        }
    }

    #[rstest]
    #[tokio::test]
    async fn admins_cannot_promote_to_or_edit_super_admins(service: AccountService) {
        let manager = service
            .create(&root_identity(), new_account("manager@example.com", Role::Manager))
            .await
            .expect("create manager");
        let owner = service
            .create(&root_identity(), new_account("owner@example.com", Role::SuperAdmin))
            .await
            .expect("create owner");

        let promote = service
            .update(
                &admin(),
                manager.id,
                AccountPatch {
                    role: Some(Role::SuperAdmin),
                    ..AccountPatch::default()
                },
            )
            .await
            .expect_err("promotion above admin");
        assert_eq!(promote.kind(), ErrorKind::Authorization);
        let unchanged = service.get(manager.id).await.expect("manager");
        assert_eq!(unchanged.role, Role::Manager);

        let demote = service
            .update(
                &admin(),
                owner.id,
                AccountPatch {
                    is_active: Some(false),
                    ..AccountPatch::default()
                },
            )
            .await
            .expect_err("editing a super admin");
        assert_eq!(demote.kind(), ErrorKind::Authorization);
    }

    #[rstest]
    #[tokio::test]
    async fn password_patch_is_hashed(service: AccountService) {
        let view = service
            .create(&root_identity(), new_account("ops@example.com", Role::Manager))
            .await
            .expect("create account");

        service
            .update(
                &admin(),
                view.id,
                AccountPatch {
                    password: Some("another secret".to_owned()),
                    ..AccountPatch::default()
                },
            )
            .await
            .expect("update password");

        let stored = service.accounts.require(view.id).await.expect("stored account");
        assert_eq!(stored.password_hash, "hashed:14");
    }

    #[rstest]
    #[tokio::test]
    async fn bootstrap_runs_only_on_an_empty_store(service: AccountService) {
        let admin = BootstrapAdmin {
            email: "owner@example.com".to_owned(),
            password: "first run secret".to_owned(),
            name: "Owner".to_owned(),
        };

        let created = service.bootstrap(admin.clone()).await.expect("bootstrap");
        let created = created.expect("first run creates the owner");
        assert_eq!(created.role, Role::SuperAdmin);
        assert_eq!(created.permissions.len(), Permission::ALL.len());

        assert_eq!(service.bootstrap(admin).await.expect("second bootstrap"), None);
    }
}
