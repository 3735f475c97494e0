//! Operator account management under `/api/admin/accounts`.
//!
//! Restricted to `super_admin` and `admin` roles holding `manage_accounts`.
//! Callers cannot grant or manage a role above their own. Responses never
//! include password hashes.

use actix_web::{HttpResponse, get, patch, post, web};

use super::envelope;
use super::identity::Authenticated;
use super::schemas::{by_id, by_id_with_body, email, paging, path_id, text};
use super::state::HttpState;
use super::validated::Validated;
use crate::domain::validation::{ArrayRule, FieldRule, FieldSet, SchemaDescriptor, StringRule};
use crate::domain::{ADMIN_PAGE_LIMITS, AccountPatch, NewAccount, PageQuery, Permission, Role};
use crate::inbound::http::ApiResult;
use crate::route_schema;

fn password() -> FieldRule {
    FieldRule::string(StringRule::new().min_len(8).max_len(128))
}

fn permissions() -> FieldRule {
    let permission = FieldRule::one_of(Permission::wire_names());
    FieldRule::array(ArrayRule::of(permission).max_items(Permission::ALL.len()))
}

route_schema!(ListSchema => SchemaDescriptor::new()
    .query(paging(FieldSet::new(), ADMIN_PAGE_LIMITS.max_limit())));

route_schema!(IdSchema => by_id());

route_schema!(CreateSchema => SchemaDescriptor::new().body(
    FieldSet::new()
        .field("email", email())
        .field("name", text(1, 80))
        .field("password", password())
        .field("role", FieldRule::one_of(Role::wire_names()))
        .field("permissions", permissions().optional())
        .field("isActive", FieldRule::boolean().optional())
));

route_schema!(UpdateSchema => by_id_with_body(
    FieldSet::new()
        .field("name", text(1, 80).optional())
        .field("password", password().optional())
        .field("role", FieldRule::one_of(Role::wire_names()).optional())
        .field("permissions", permissions().optional())
        .field("isActive", FieldRule::boolean().optional())
));

#[get("")]
pub async fn list_accounts(
    state: web::Data<HttpState>,
    request: Validated<ListSchema>,
) -> ApiResult<HttpResponse> {
    let page: PageQuery = request.query_as()?;
    Ok(envelope::ok(state.accounts.list(page).await?))
}

#[get("/{id}")]
pub async fn show_account(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(state.accounts.get(path_id(&request)?).await?))
}

#[post("")]
pub async fn create_account(
    state: web::Data<HttpState>,
    request: Validated<CreateSchema>,
    caller: Authenticated,
) -> ApiResult<HttpResponse> {
    let input: NewAccount = request.body_as()?;
    let account = state.accounts.create(caller.identity(), input).await?;
    Ok(envelope::created(account))
}

/// Setting `isActive` to `false` revokes outstanding credentials on the
/// account's next request.
#[patch("/{id}")]
pub async fn update_account(
    state: web::Data<HttpState>,
    request: Validated<UpdateSchema>,
    caller: Authenticated,
) -> ApiResult<HttpResponse> {
    let patch: AccountPatch = request.body_as()?;
    let account = state
        .accounts
        .update(caller.identity(), path_id(&request)?, patch)
        .await?;
    Ok(envelope::ok(account))
}
