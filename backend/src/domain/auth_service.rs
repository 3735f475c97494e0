//! Operator login against stored accounts.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error, info};

use super::account_service::map_hash_error;
use crate::domain::ports::{
    DocumentStore, Filter, LoginService, LoginSession, PasswordHasher, TokenService,
};
use crate::domain::repository::Repository;
use crate::domain::{Account, AccountView, Error, LoginCredentials};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const ACCOUNT_INACTIVE: &str = "Account is inactive";

/// [`LoginService`] backed by the account collection.
#[derive(Clone)]
pub struct AccountLoginService {
    accounts: Repository<Account>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
}

impl AccountLoginService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts: Repository::new(store),
            hasher,
            tokens,
            clock,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let mut matches = self.accounts.all(&Filter::eq("email", email)).await?;
        Ok(matches.pop())
    }
}

#[async_trait]
impl LoginService for AccountLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<LoginSession, Error> {
        let Some(mut account) = self.find_by_email(credentials.email()).await? else {
            debug!("login rejected: unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            debug!(account_id = %account.id, "login rejected: wrong password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        if !account.is_active {
            debug!(account_id = %account.id, "login rejected: inactive account");
            return Err(Error::unauthorized(ACCOUNT_INACTIVE));
        }

        let now = self.clock.utc();
        account.last_login_at = Some(now);
        account.updated_at = now;
        self.accounts.replace(&account).await?;

        let issued = self.tokens.issue(&account.identity()).map_err(|err| {
            error!(error = %err, "failed to issue credential");
            Error::internal(err.to_string())
        })?;
        info!(account_id = %account.id, "operator logged in");
        Ok(LoginSession {
            token: issued.token,
            expires_at: issued.expires_at,
            account: AccountView::from(&account),
        })
    }
}
