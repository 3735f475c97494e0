//! Analytics endpoints under `/api/admin/dashboard`.

use actix_web::{HttpResponse, get, web};

use super::envelope;
use super::schemas;
use super::state::HttpState;
use super::validated::Validated;
use crate::domain::validation::{FieldRule, FieldSet, SchemaDescriptor};
use crate::domain::{BikeStatus, InventoryQuery, InventorySort};
use crate::inbound::http::ApiResult;
use crate::route_schema;

route_schema!(InventorySchema => SchemaDescriptor::new().query(
    FieldSet::new()
        .field("sort", FieldRule::one_of(InventorySort::wire_names()).optional())
        .field("order", schemas::order().optional())
        .field("status", FieldRule::one_of(BikeStatus::wire_names()).optional())
));

/// Inventory, revenue, profit, rating and monthly sales figures.
#[get("")]
pub async fn summary(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(state.dashboard.summary().await?))
}

/// Per-bike financial rows.
#[get("/inventory")]
pub async fn inventory(
    state: web::Data<HttpState>,
    request: Validated<InventorySchema>,
) -> ApiResult<HttpResponse> {
    let query: InventoryQuery = request.query_as()?;
    Ok(envelope::ok(state.dashboard.inventory(query).await?))
}
