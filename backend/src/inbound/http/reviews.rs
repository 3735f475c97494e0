//! Review endpoints.
//!
//! ```text
//! GET    /api/reviews               approved reviews, average rating, count
//! POST   /api/reviews               storefront submission, stored unapproved
//! GET    /api/admin/reviews?approved=false
//! PATCH  /api/admin/reviews/{id}    {"approved":true}
//! DELETE /api/admin/reviews/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};

use super::envelope;
use super::schemas::{by_id, by_id_with_body, integer, paging, path_id, text, uuid};
use super::state::HttpState;
use super::validated::Validated;
use crate::domain::validation::{FieldRule, FieldSet, SchemaDescriptor, StringFormat, StringRule};
use crate::domain::{
    ADMIN_PAGE_LIMITS, NewReview, PageQuery, REVIEW_PAGE_LIMITS, ReviewPatch, ReviewQuery,
};
use crate::inbound::http::ApiResult;
use crate::route_schema;

route_schema!(PublishedSchema => SchemaDescriptor::new()
    .query(paging(FieldSet::new(), REVIEW_PAGE_LIMITS.max_limit())));

route_schema!(SubmitSchema => SchemaDescriptor::new().body(
    FieldSet::new()
        .field("name", text(1, 80))
        .field("rating", integer(1.0, 5.0))
        .field("description", text(1, 2000))
        .field(
            "image",
            FieldRule::string(StringRule::new().trim().format(StringFormat::Url)).optional(),
        )
        .field("bikeId", uuid().optional())
));

route_schema!(ModerationListSchema => SchemaDescriptor::new().query(
    paging(FieldSet::new(), ADMIN_PAGE_LIMITS.max_limit())
        .field("approved", FieldRule::boolean().optional())
));

route_schema!(IdSchema => by_id());

route_schema!(ModerateSchema => by_id_with_body(
    FieldSet::new()
        .field("approved", FieldRule::boolean().optional())
        .field("name", text(1, 80).optional())
        .field("description", text(1, 2000).optional())
));

#[get("")]
pub async fn list_published(
    state: web::Data<HttpState>,
    request: Validated<PublishedSchema>,
) -> ApiResult<HttpResponse> {
    let page: PageQuery = request.query_as()?;
    Ok(envelope::ok(state.reviews.published(page).await?))
}

#[post("")]
pub async fn submit_review(
    state: web::Data<HttpState>,
    request: Validated<SubmitSchema>,
) -> ApiResult<HttpResponse> {
    let input: NewReview = request.body_as()?;
    Ok(envelope::created(state.reviews.submit(input).await?))
}

#[get("")]
pub async fn list_reviews(
    state: web::Data<HttpState>,
    request: Validated<ModerationListSchema>,
) -> ApiResult<HttpResponse> {
    let query: ReviewQuery = request.query_as()?;
    Ok(envelope::ok(state.reviews.list(query).await?))
}

#[patch("/{id}")]
pub async fn moderate_review(
    state: web::Data<HttpState>,
    request: Validated<ModerateSchema>,
) -> ApiResult<HttpResponse> {
    let patch: ReviewPatch = request.body_as()?;
    let review = state.reviews.update(path_id(&request)?, patch).await?;
    Ok(envelope::ok(review))
}

#[delete("/{id}")]
pub async fn delete_review(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    state.reviews.delete(path_id(&request)?).await?;
    Ok(envelope::message("Review deleted"))
}
