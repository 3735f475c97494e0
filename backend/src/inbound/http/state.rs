//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` and call domain
//! services only. The login use-case sits behind the [`LoginService`] port so
//! handler tests can substitute a double.

use std::sync::Arc;

use actix_web::cookie::SameSite;
use mockable::Clock;

use crate::domain::ports::{DocumentStore, LoginService, PasswordHasher, TokenService};
use crate::domain::{
    AccountLoginService, AccountService, AuthGateService, BikeService, CostService,
    DashboardService, PartnerService, ReviewService, TransactionService,
};

/// Attributes applied to the credential cookie set at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Adapters the HTTP state is assembled from.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<dyn TokenService>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub auth_gate: AuthGateService,
    pub bikes: BikeService,
    pub partners: PartnerService,
    pub costs: CostService,
    pub transactions: TransactionService,
    pub reviews: ReviewService,
    pub accounts: AccountService,
    pub dashboard: DashboardService,
    pub cookies: CookiePolicy,
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Wire every service over the supplied adapters.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use chrono::Duration;
    /// use mockable::DefaultClock;
    /// use marketplace::inbound::http::state::{HttpState, HttpStatePorts};
    /// use marketplace::outbound::persistence::{PoolConfig, acquire};
    /// use marketplace::outbound::security::{BcryptPasswordHasher, JwtTokenService};
    ///
    /// # async fn run() -> Result<(), marketplace::domain::ports::DocumentStoreError> {
    /// let clock = Arc::new(DefaultClock);
    /// let store = acquire(&PoolConfig::new("postgres://localhost/marketplace")).await?;
    /// let state = HttpState::new(HttpStatePorts {
    ///     store,
    ///     tokens: Arc::new(JwtTokenService::new(b"secret", Duration::hours(1), clock.clone())),
    ///     hasher: Arc::new(BcryptPasswordHasher::new(4)),
    ///     clock,
    /// });
    /// let _login = state.login.clone();
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            store,
            tokens,
            hasher,
            clock,
        } = ports;
        let login = AccountLoginService::new(
            Arc::clone(&store),
            Arc::clone(&hasher),
            Arc::clone(&tokens),
            Arc::clone(&clock),
        );
        Self {
            login: Arc::new(login),
            auth_gate: AuthGateService::new(tokens, Arc::clone(&store)),
            bikes: BikeService::new(Arc::clone(&store), Arc::clone(&clock)),
            partners: PartnerService::new(Arc::clone(&store), Arc::clone(&clock)),
            costs: CostService::new(Arc::clone(&store), Arc::clone(&clock)),
            transactions: TransactionService::new(Arc::clone(&store), Arc::clone(&clock)),
            reviews: ReviewService::new(Arc::clone(&store), Arc::clone(&clock)),
            accounts: AccountService::new(Arc::clone(&store), hasher, Arc::clone(&clock)),
            dashboard: DashboardService::new(store, Arc::clone(&clock)),
            cookies: CookiePolicy::default(),
            clock,
        }
    }

    /// Replace the login use-case.
    #[must_use]
    pub fn with_login(mut self, login: Arc<dyn LoginService>) -> Self {
        self.login = login;
        self
    }

    #[must_use]
    pub fn with_cookie_policy(mut self, cookies: CookiePolicy) -> Self {
        self.cookies = cookies;
        self
    }

    /// Replace the review service, e.g. to apply a configured page size.
    #[must_use]
    pub fn with_reviews(mut self, reviews: ReviewService) -> Self {
        self.reviews = reviews;
        self
    }
}
