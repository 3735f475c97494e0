//! Purchase and sale records under `/api/admin/transactions`.
//!
//! Recording a completed sale marks the bike sold; see
//! [`TransactionService`](crate::domain::TransactionService).

use actix_web::{HttpResponse, delete, get, patch, post, web};

use super::envelope;
use super::schemas::{by_id, by_id_with_body, money, paging, path_id, text, timestamp, uuid};
use super::state::HttpState;
use super::validated::Validated;
use crate::domain::validation::{FieldRule, FieldSet, SchemaDescriptor};
use crate::domain::{
    ADMIN_PAGE_LIMITS, NewTransaction, PaymentMethod, TransactionKind, TransactionPatch,
    TransactionQuery, TransactionStatus,
};
use crate::inbound::http::ApiResult;
use crate::route_schema;

fn transaction_fields(partial: bool) -> FieldSet {
    let required = |rule: FieldRule| if partial { rule.optional() } else { rule };
    let mut fields = FieldSet::new();
    if !partial {
        fields = fields
            .field("bikeId", uuid())
            .field("kind", FieldRule::one_of(TransactionKind::wire_names()));
    }
    fields
        .field("amount", required(money()))
        .field("partnerId", uuid().optional())
        .field("counterparty", text(1, 120).optional())
        .field("paymentMethod", required(FieldRule::one_of(PaymentMethod::wire_names())))
        .field("status", FieldRule::one_of(TransactionStatus::wire_names()).optional())
        .field("occurredAt", timestamp("occurredAt").optional())
}

route_schema!(ListSchema => SchemaDescriptor::new().query(
    paging(FieldSet::new(), ADMIN_PAGE_LIMITS.max_limit())
        .field("bikeId", uuid().optional())
        .field("kind", FieldRule::one_of(TransactionKind::wire_names()).optional())
        .field("status", FieldRule::one_of(TransactionStatus::wire_names()).optional())
));
route_schema!(IdSchema => by_id());
route_schema!(CreateSchema => SchemaDescriptor::new().body(transaction_fields(false)));
route_schema!(UpdateSchema => by_id_with_body(transaction_fields(true)));

#[get("")]
pub async fn list_transactions(
    state: web::Data<HttpState>,
    request: Validated<ListSchema>,
) -> ApiResult<HttpResponse> {
    let query: TransactionQuery = request.query_as()?;
    Ok(envelope::ok(state.transactions.list(query).await?))
}

#[get("/{id}")]
pub async fn show_transaction(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(state.transactions.get(path_id(&request)?).await?))
}

#[post("")]
pub async fn create_transaction(
    state: web::Data<HttpState>,
    request: Validated<CreateSchema>,
) -> ApiResult<HttpResponse> {
    let input: NewTransaction = request.body_as()?;
    Ok(envelope::created(state.transactions.create(input).await?))
}

#[patch("/{id}")]
pub async fn update_transaction(
    state: web::Data<HttpState>,
    request: Validated<UpdateSchema>,
) -> ApiResult<HttpResponse> {
    let patch: TransactionPatch = request.body_as()?;
    let transaction = state.transactions.update(path_id(&request)?, patch).await?;
    Ok(envelope::ok(transaction))
}

#[delete("/{id}")]
pub async fn delete_transaction(
    state: web::Data<HttpState>,
    request: Validated<IdSchema>,
) -> ApiResult<HttpResponse> {
    state.transactions.delete(path_id(&request)?).await?;
    Ok(envelope::message("Transaction deleted"))
}
