//! Partner directory endpoints under `/api/admin/partners`.
//!
//! ```text
//! GET /api/admin/partners?kind=mechanic&isActive=true&search=moto
//! POST /api/admin/partners {"name":"Moto Works","kind":"mechanic"}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};

use super::envelope;
use super::schemas::{by_id, by_id_with_body, email, paging, path_id, text};
use super::state::HttpState;
use super::validated::Validated;
use crate::domain::validation::{FieldRule, FieldSet, SchemaDescriptor};
use crate::domain::{ADMIN_PAGE_LIMITS, NewPartner, PartnerKind, PartnerPatch, PartnerQuery};
use crate::inbound::http::ApiResult;
use crate::route_schema;

fn partner_fields(partial: bool) -> FieldSet {
    let required = |rule: FieldRule| if partial { rule.optional() } else { rule };
    FieldSet::new()
        .field("name", required(text(1, 120)))
        .field("kind", required(FieldRule::one_of(PartnerKind::wire_names())))
        .field("email", email().optional())
        .field("phone", text(3, 40).optional())
        .field("notes", text(0, 2000).optional())
        .field("isActive", FieldRule::boolean().optional())
}

route_schema!(ListSchema => SchemaDescriptor::new().query(
    paging(FieldSet::new(), ADMIN_PAGE_LIMITS.max_limit())
        .field("kind", FieldRule::one_of(PartnerKind::wire_names()).optional())
        .field("isActive", FieldRule::boolean().optional())
        .field("search", text(0, 100).optional())
));
route_schema!(IdSchema => by_id());
route_schema!(CreateSchema => SchemaDescriptor::new().body(partner_fields(false)));
route_schema!(UpdateSchema => by_id_with_body(partner_fields(true)));

#[get("")]
pub async fn list_partners(
    state: web::Data<HttpState>,
    request: Validated<ListSchema>,
) -> ApiResult<HttpResponse> {
    let query: PartnerQuery = request.query_as()?;
    Ok(envelope::ok(state.partners.list(query).await?))
}

#[get("/{id}")]
pub async fn show_partner(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(state.partners.get(path_id(&request)?).await?))
}

/// Duplicate emails are rejected as conflicts.
#[post("")]
pub async fn create_partner(
    state: web::Data<HttpState>,
    request: Validated<CreateSchema>,
) -> ApiResult<HttpResponse> {
    let input: NewPartner = request.body_as()?;
    Ok(envelope::created(state.partners.create(input).await?))
}

#[patch("/{id}")]
pub async fn update_partner(
    state: web::Data<HttpState>,
    request: Validated<UpdateSchema>,
) -> ApiResult<HttpResponse> {
    let patch: PartnerPatch = request.body_as()?;
    let partner = state.partners.update(path_id(&request)?, patch).await?;
    Ok(envelope::ok(partner))
}

#[delete("/{id}")]
pub async fn delete_partner(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    state.partners.delete(path_id(&request)?).await?;
    Ok(envelope::message("Partner deleted"))
}
