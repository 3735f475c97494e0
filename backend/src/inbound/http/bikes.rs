//! Bike inventory endpoints.
//!
//! ```text
//! GET    /api/bikes                 storefront listing (optional gate)
//! GET    /api/bikes/{id}            storefront detail
//! GET    /api/admin/bikes           back-office listing
//! POST   /api/admin/bikes
//! GET    /api/admin/bikes/{id}      detail with financials and costs
//! PATCH  /api/admin/bikes/{id}
//! DELETE /api/admin/bikes/{id}      also removes the bike's costs
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};

use super::envelope;
use super::identity::MaybeAuthenticated;
use super::schemas::{
    self, by_id, by_id_with_body, image_urls, integer, money, paging, path_id, text, timestamp,
    uuid,
};
use super::state::HttpState;
use super::validated::Validated;
use crate::domain::validation::{FieldRule, FieldSet, Pattern, SchemaDescriptor, StringRule};
use crate::domain::{
    BikeCondition, BikePatch, BikeQuery, BikeSort, BikeStatus, NewBike, STOREFRONT_PAGE_LIMITS,
};
use crate::inbound::http::ApiResult;
use crate::route_schema;

const VIN_PATTERN: &str = r"^[A-HJ-NPR-Za-hj-npr-z0-9]{11,17}$";

fn listing_query() -> FieldSet {
    let search = FieldRule::string(StringRule::new().trim().max_len(100)).optional();
    paging(FieldSet::new(), STOREFRONT_PAGE_LIMITS.max_limit())
        .field("sort", FieldRule::one_of(BikeSort::wire_names()).optional())
        .field("order", schemas::order().optional())
        .field("make", search.clone())
        .field("condition", FieldRule::one_of(BikeCondition::wire_names()).optional())
        .field("status", FieldRule::one_of(BikeStatus::wire_names()).optional())
        .field("minPrice", money().optional())
        .field("maxPrice", money().optional())
        .field("minYear", integer(1900.0, 2100.0).optional())
        .field("maxYear", integer(1900.0, 2100.0).optional())
        .field("featured", FieldRule::boolean().optional())
        .field("search", search)
}

/// Body fields for create (`partial = false`) and update (`partial = true`).
fn bike_fields(partial: bool) -> FieldSet {
    let required = |rule: FieldRule| if partial { rule.optional() } else { rule };
    let vin = FieldRule::string(StringRule::new().trim().pattern(Pattern::new(
        VIN_PATTERN,
        "vin must be 11 to 17 letters or digits, excluding I, O and Q",
    )));
    let mut fields = FieldSet::new()
        .field("make", required(text(1, 60)))
        .field("model", required(text(1, 80)))
        .field("year", required(integer(1900.0, 2100.0)))
        .field("mileage", required(integer(0.0, 2_000_000.0)))
        .field("vin", vin.optional())
        .field("engineCc", integer(50.0, 3000.0).optional())
        .field("color", text(1, 40).optional())
        .field("condition", required(FieldRule::one_of(BikeCondition::wire_names())))
        .field("purchasePrice", required(money()))
        .field("askingPrice", required(money()))
        .field("status", FieldRule::one_of(BikeStatus::wire_names()).optional())
        .field("partnerId", uuid().optional())
        .field("acquiredAt", timestamp("acquiredAt").optional())
        .field("description", text(0, 5000).optional())
        .field("images", image_urls().optional())
        .field("featured", FieldRule::boolean().optional());
    if partial {
        fields = fields
            .field("soldAt", timestamp("soldAt").optional())
            .field("salePrice", money().optional());
    }
    fields
}

route_schema!(ListingSchema => SchemaDescriptor::new().query(listing_query()));
route_schema!(IdSchema => by_id());
route_schema!(CreateSchema => SchemaDescriptor::new().body(bike_fields(false)));
route_schema!(UpdateSchema => by_id_with_body(bike_fields(true)));

/// Storefront listing. Anonymous visitors see available and reserved bikes
/// without purchase prices.
#[get("")]
pub async fn list_storefront(
    state: web::Data<HttpState>,
    viewer: MaybeAuthenticated,
    request: Validated<ListingSchema>,
) -> ApiResult<HttpResponse> {
    let query: BikeQuery = request.query_as()?;
    let page = state.bikes.list_public(query, viewer.identity()).await?;
    Ok(envelope::ok(page))
}

#[get("/{id}")]
pub async fn show_storefront(
    state: web::Data<HttpState>,
    viewer: MaybeAuthenticated,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    let bike = state
        .bikes
        .get_public(path_id(&request)?, viewer.identity())
        .await?;
    Ok(envelope::ok(bike))
}

#[get("")]
pub async fn list_inventory(
    state: web::Data<HttpState>,
    request: Validated<ListingSchema>,
) -> ApiResult<HttpResponse> {
    let query: BikeQuery = request.query_as()?;
    Ok(envelope::ok(state.bikes.list(query).await?))
}

#[get("/{id}")]
pub async fn show_inventory(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(state.bikes.detail(path_id(&request)?).await?))
}

#[post("")]
pub async fn create_bike(
    state: web::Data<HttpState>,
    request: Validated<CreateSchema>,
) -> ApiResult<HttpResponse> {
    let input: NewBike = request.body_as()?;
    Ok(envelope::created(state.bikes.create(input).await?))
}

#[patch("/{id}")]
pub async fn update_bike(
    state: web::Data<HttpState>,
    request: Validated<UpdateSchema>,
) -> ApiResult<HttpResponse> {
    let patch: BikePatch = request.body_as()?;
    let bike = state.bikes.update(path_id(&request)?, patch).await?;
    Ok(envelope::ok(bike))
}

#[delete("/{id}")]
pub async fn delete_bike(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    state.bikes.delete(path_id(&request)?).await?;
    Ok(envelope::message("Bike deleted"))
}
