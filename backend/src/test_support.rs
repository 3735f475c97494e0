//! Shared helpers for unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for `cargo test` and behind the `test-support`
//! feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_web::web;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    Collection, Document, DocumentStore, DocumentStoreError, Filter, FindOptions, TokenService,
};
use crate::domain::{
    AccountPatch, AccountView, BikeCondition, Identity, NewAccount, NewBike, Permission, Role,
};
use crate::inbound::http::state::{CookiePolicy, HttpState, HttpStatePorts};
use crate::outbound::persistence::MemoryDocumentStore;
use crate::outbound::security::{BcryptPasswordHasher, DEFAULT_TOKEN_TTL, JwtTokenService};

/// Signing secret used by [`Harness`].
pub const TEST_SECRET: &[u8] = b"marketplace-test-signing-secret-0123456789";
/// Password given to every account seeded by [`Harness::seed_account`].
pub const TEST_PASSWORD: &str = "correct horse battery";
/// Instant the [`Harness`] clock starts at.
pub const TEST_EPOCH: &str = "2024-06-01T12:00:00Z";

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock standing at [`TEST_EPOCH`].
    pub fn at_test_epoch() -> Self {
        let now = DateTime::parse_from_rfc3339(TEST_EPOCH)
            .expect("test epoch is valid RFC 3339")
            .with_timezone(&Utc);
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Store wrapper counting every call, for asserting that a path never
/// touched persistence.
pub struct CountingStore {
    inner: Arc<dyn DocumentStore>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        self.record();
        self.inner.find(collection, filter, options).await
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, DocumentStoreError> {
        self.record();
        self.inner.count(collection, filter).await
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        self.record();
        self.inner.find_by_id(collection, id).await
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), DocumentStoreError> {
        self.record();
        self.inner.insert(collection, document).await
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<bool, DocumentStoreError> {
        self.record();
        self.inner.replace(collection, id, document).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, DocumentStoreError> {
        self.record();
        self.inner.delete(collection, id).await
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> Result<u64, DocumentStoreError> {
        self.record();
        self.inner.delete_many(collection, filter).await
    }
}

/// Minimal valid inventory input for `model`, bought for 3000 and listed
/// at 4500.
pub fn new_bike(model: &str) -> NewBike {
    NewBike {
        make: "Honda".to_owned(),
        model: model.to_owned(),
        year: 2019,
        mileage: 12_000,
        vin: None,
        engine_cc: Some(650),
        color: None,
        condition: BikeCondition::Good,
        purchase_price: 3000.0,
        asking_price: 4500.0,
        status: None,
        partner_id: None,
        acquired_at: None,
        description: String::new(),
        images: Vec::new(),
        featured: false,
    }
}

/// Super administrator identity that owns every seeded account.
pub fn root_identity() -> Identity {
    Identity::new(Uuid::nil(), "root@example.com", Role::SuperAdmin, [])
}

/// Fully wired HTTP state over an in-memory store, a controllable clock and
/// real credential adapters.
pub struct Harness {
    pub store: Arc<CountingStore>,
    pub clock: Arc<MutableClock>,
    pub tokens: Arc<JwtTokenService>,
    pub state: HttpState,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(MutableClock::at_test_epoch());
        let store = Arc::new(CountingStore::new(Arc::new(MemoryDocumentStore::new())));
        let tokens = Arc::new(JwtTokenService::new(TEST_SECRET, DEFAULT_TOKEN_TTL, clock.clone()));
        let state = HttpState::new(HttpStatePorts {
            store: store.clone(),
            tokens: tokens.clone(),
            hasher: Arc::new(BcryptPasswordHasher::new(4)),
            clock: clock.clone(),
        })
        .with_cookie_policy(CookiePolicy {
            secure: false,
            ..CookiePolicy::default()
        });
        Self {
            store,
            clock,
            tokens,
            state,
        }
    }

    pub fn data(&self) -> web::Data<HttpState> {
        web::Data::new(self.state.clone())
    }

    /// Create an account with [`TEST_PASSWORD`].
    pub async fn seed_account(
        &self,
        email: &str,
        role: Role,
        permissions: &[Permission],
        active: bool,
    ) -> AccountView {
        let root = root_identity();
        let account = self
            .state
            .accounts
            .create(
                &root,
                NewAccount {
                    email: email.to_owned(),
                    name: "Test Operator".to_owned(),
                    password: TEST_PASSWORD.to_owned(),
                    role,
                    permissions: permissions.iter().copied().collect(),
                    is_active: true,
                },
            )
            .await
            .expect("seed account");
        if active {
            return account;
        }
        self.state
            .accounts
            .update(
                &root,
                account.id,
                AccountPatch {
                    is_active: Some(false),
                    ..AccountPatch::default()
                },
            )
            .await
            .expect("deactivate account")
    }

    /// Signed credential for `account` as of the current harness time.
    pub fn token_for(&self, account: &AccountView) -> String {
        let identity = Identity::new(
            account.id,
            account.email.clone(),
            account.role,
            account.permissions.iter().copied(),
        );
        self.tokens.issue(&identity).expect("issue token").token
    }
}
