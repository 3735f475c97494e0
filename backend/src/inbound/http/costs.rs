//! Cost ledger endpoints under `/api/admin/costs`.

use actix_web::{HttpResponse, delete, get, patch, post, web};

use super::envelope;
use super::schemas::{by_id, by_id_with_body, money, paging, path_id, text, timestamp, uuid};
use super::state::HttpState;
use super::validated::Validated;
use crate::domain::validation::{FieldRule, FieldSet, SchemaDescriptor};
use crate::domain::{ADMIN_PAGE_LIMITS, CostCategory, CostPatch, CostQuery, NewCost};
use crate::inbound::http::ApiResult;
use crate::route_schema;

fn cost_fields(partial: bool) -> FieldSet {
    let required = |rule: FieldRule| if partial { rule.optional() } else { rule };
    let mut fields = FieldSet::new();
    if !partial {
        fields = fields.field("bikeId", uuid());
    }
    fields
        .field("category", required(FieldRule::one_of(CostCategory::wire_names())))
        .field("amount", required(money()))
        .field("description", text(0, 1000).optional())
        .field("partnerId", uuid().optional())
        .field("incurredAt", timestamp("incurredAt").optional())
}

route_schema!(ListSchema => SchemaDescriptor::new().query(
    paging(FieldSet::new(), ADMIN_PAGE_LIMITS.max_limit())
        .field("bikeId", uuid().optional())
        .field("category", FieldRule::one_of(CostCategory::wire_names()).optional())
));
route_schema!(IdSchema => by_id());
route_schema!(CreateSchema => SchemaDescriptor::new().body(cost_fields(false)));
route_schema!(UpdateSchema => by_id_with_body(cost_fields(true)));

#[get("")]
pub async fn list_costs(
    state: web::Data<HttpState>,
    request: Validated<ListSchema>,
) -> ApiResult<HttpResponse> {
    let query: CostQuery = request.query_as()?;
    Ok(envelope::ok(state.costs.list(query).await?))
}

#[get("/{id}")]
pub async fn show_cost(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(state.costs.get(path_id(&request)?).await?))
}

#[post("")]
pub async fn create_cost(
    state: web::Data<HttpState>,
    request: Validated<CreateSchema>,
) -> ApiResult<HttpResponse> {
    let input: NewCost = request.body_as()?;
    Ok(envelope::created(state.costs.create(input).await?))
}

#[patch("/{id}")]
pub async fn update_cost(
    state: web::Data<HttpState>,
    request: Validated<UpdateSchema>,
) -> ApiResult<HttpResponse> {
    let patch: CostPatch = request.body_as()?;
    let cost = state.costs.update(path_id(&request)?, patch).await?;
    Ok(envelope::ok(cost))
}

#[delete("/{id}")]
pub async fn delete_cost(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    state.costs.delete(path_id(&request)?).await?;
    Ok(envelope::message("Cost deleted"))
}
