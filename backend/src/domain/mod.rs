//! Domain primitives, aggregates and use-case services.
//!
//! Purpose: define the marketplace's entities (bikes, partners, costs,
//! transactions, reviews and operator accounts), the request validation
//! interpreter, the auth gate decision logic and the services that drive
//! them. Nothing here touches HTTP or a concrete store; adapters reach the
//! outside world through [`ports`].
//!
//! Public surface:
//! - [`Error`] and [`ErrorKind`]: the error taxonomy every layer speaks.
//! - [`validation`]: schema descriptors and [`validation::validate_request`].
//! - [`AuthGateService`]: credential to [`Identity`] resolution.
//! - One service per entity plus [`DashboardService`] for analytics.

mod account;
mod account_service;
pub mod analytics;
mod auth;
mod auth_gate;
mod auth_service;
mod bike;
mod bike_service;
mod cost;
mod cost_service;
mod dashboard_service;
pub mod error;
mod listing;
mod partner;
mod partner_service;
mod patch;
pub mod ports;
mod repository;
mod review;
mod review_service;
mod trace_id;
mod transaction;
mod transaction_service;
pub mod validation;
mod wire_enum;

pub use self::account::{Account, AccountPatch, AccountView, NewAccount};
pub use self::account_service::{AccountService, BootstrapAdmin};
pub use self::auth::{CredentialClaims, Identity, LoginCredentials, LoginValidationError, Permission, Role};
pub use self::auth_gate::{
    AccessPolicy, AuthFailure, AuthGateService, AuthMode, CredentialSources, GateOutcome,
};
pub use self::auth_service::AccountLoginService;
pub use self::bike::{Bike, BikeCondition, BikePatch, BikeStatus, NewBike, PublicBike};
pub use self::bike_service::{BikeDetail, BikeQuery, BikeService, BikeSort, STOREFRONT_PAGE_LIMITS};
pub use self::cost::{Cost, CostCategory, CostPatch, NewCost};
pub use self::cost_service::{CostQuery, CostService};
pub use self::dashboard_service::{
    DashboardService, DashboardSummary, InventoryQuery, InventorySort, MonthlySales, ReviewCounts,
    StatusCounts, TREND_MONTHS,
};
pub use self::error::{Error, ErrorKind, ErrorValidationError, FieldError};
pub use self::listing::{ADMIN_PAGE_LIMITS, PageQuery, SortDirection};
pub use self::partner::{NewPartner, Partner, PartnerKind, PartnerPatch};
pub use self::partner_service::{PartnerQuery, PartnerService};
pub use self::repository::{Entity, Repository};
pub use self::review::{NewReview, Review, ReviewPatch};
pub use self::review_service::{PublishedReviews, REVIEW_PAGE_LIMITS, ReviewQuery, ReviewService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::transaction::{
    NewTransaction, PaymentMethod, Transaction, TransactionKind, TransactionPatch,
    TransactionStatus,
};
pub use self::transaction_service::{TransactionQuery, TransactionService};
pub use self::wire_enum::UnknownVariant;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use marketplace::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<u32> {
///     Err(Error::not_found("Bike not found"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
