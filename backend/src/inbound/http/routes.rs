//! Route table for the REST API.
//!
//! Public storefront routes sit under `/api`; back-office routes sit under
//! `/api/admin` behind a required [`AuthGate`] refined per resource.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, web};

use super::health::HealthState;
use super::state::HttpState;
use super::{accounts, auth, bikes, costs, dashboard, health, partners, reviews, transactions};
use crate::domain::{Error, Permission, Role};
use crate::inbound::http::ApiResult;
use crate::middleware::{AuthGate, Trace};

/// Largest request body accepted by any route.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Register every route on `cfg`.
///
/// The caller provides `web::Data<HttpState>` and `web::Data<HealthState>`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use marketplace::inbound::http::routes::configure;
///
/// let _app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/api/bikes")
                .wrap(AuthGate::optional())
                .service(bikes::list_storefront)
                .service(bikes::show_storefront),
        )
        .service(
            web::scope("/api/reviews")
                .service(reviews::list_published)
                .service(reviews::submit_review),
        )
        .service(
            web::scope("/api/admin/auth")
                .service(auth::login)
                .service(auth::logout)
                .service(web::scope("").wrap(AuthGate::required()).service(auth::me)),
        )
        .service(
            web::scope("/api/admin/bikes")
                .wrap(AuthGate::required().permission(Permission::ManageBikes))
                .service(bikes::list_inventory)
                .service(bikes::create_bike)
                .service(bikes::show_inventory)
                .service(bikes::update_bike)
                .service(bikes::delete_bike),
        )
        .service(
            web::scope("/api/admin/partners")
                .wrap(AuthGate::required().permission(Permission::ManagePartners))
                .service(partners::list_partners)
                .service(partners::create_partner)
                .service(partners::show_partner)
                .service(partners::update_partner)
                .service(partners::delete_partner),
        )
        .service(
            web::scope("/api/admin/costs")
                .wrap(AuthGate::required().permission(Permission::ManageCosts))
                .service(costs::list_costs)
                .service(costs::create_cost)
                .service(costs::show_cost)
                .service(costs::update_cost)
                .service(costs::delete_cost),
        )
        .service(
            web::scope("/api/admin/transactions")
                .wrap(AuthGate::required().permission(Permission::ManageTransactions))
                .service(transactions::list_transactions)
                .service(transactions::create_transaction)
                .service(transactions::show_transaction)
                .service(transactions::update_transaction)
                .service(transactions::delete_transaction),
        )
        .service(
            web::scope("/api/admin/reviews")
                .wrap(AuthGate::required().permission(Permission::ManageReviews))
                .service(reviews::list_reviews)
                .service(reviews::moderate_review)
                .service(reviews::delete_review),
        )
        .service(
            web::scope("/api/admin/accounts")
                .wrap(
                    AuthGate::required()
                        .permission(Permission::ManageAccounts)
                        .roles([Role::SuperAdmin, Role::Admin]),
                )
                .service(accounts::list_accounts)
                .service(accounts::create_account)
                .service(accounts::show_account)
                .service(accounts::update_account),
        )
        .service(
            web::scope("/api/admin/dashboard")
                .wrap(AuthGate::required().permission(Permission::ViewDashboard))
                .service(dashboard::summary)
                .service(dashboard::inventory),
        );
}

/// Fallback for unknown paths and unsupported methods.
async fn route_not_found() -> ApiResult<HttpResponse> {
    Err(Error::not_found("Route not found"))
}

/// Complete application: shared state, tracing and every route.
///
/// Requests no route claims get a `not_found` envelope. The server builds
/// one per worker; tests build one per case.
pub fn application(
    state: web::Data<HttpState>,
    health: web::Data<HealthState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(health)
        .wrap(Trace)
        .configure(configure)
        .default_service(web::to(route_not_found))
}
