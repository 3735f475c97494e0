//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::error::{ErrorNotFound, ErrorPayloadTooLarge};
use rstest::rstest;
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn render(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let body = serde_json::from_slice(&bytes).expect("envelope is JSON");
    (status, header, body)
}

#[rstest]
#[case(Error::validation(vec![]), StatusCode::BAD_REQUEST, "validation_error")]
#[case(Error::conflict("vin already exists"), StatusCode::BAD_REQUEST, "conflict")]
#[case(Error::unauthorized("no"), StatusCode::UNAUTHORIZED, "authentication_error")]
#[case(Error::forbidden("no"), StatusCode::FORBIDDEN, "authorization_error")]
#[case(Error::not_found("Bike not found"), StatusCode::NOT_FOUND, "not_found")]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR, "internal_error")]
#[actix_web::test]
async fn kinds_map_to_status_and_code(
    #[case] error: Error,
    #[case] status: StatusCode,
    #[case] code: &str,
) {
    let (actual, _, body) = render(&error).await;
    assert_eq!(actual, status);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!(code));
}

#[actix_web::test]
async fn validation_errors_list_field_errors() {
    let error = Error::validation(vec![
        FieldError::new("rating", "rating must be at most 5"),
        FieldError::new("image", "image must be a valid URL"),
    ]);
    let (_, _, body) = render(&error).await;
    assert_eq!(body["message"], json!("Validation failed"));
    assert_eq!(
        body["errors"],
        json!([
            {"path": "rating", "message": "rating must be at most 5"},
            {"path": "image", "message": "image must be a valid URL"},
        ])
    );
}

#[actix_web::test]
async fn internal_errors_are_redacted() {
    let error = Error::internal("database exploded")
        .with_details(json!({"secret": "x"}))
        .with_trace_id(TRACE_ID);
    let (_, header, body) = render(&error).await;
    assert_eq!(body["message"], json!("Internal server error"));
    assert!(body.get("details").is_none());
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body["traceId"], json!(TRACE_ID));
}

#[actix_web::test]
async fn client_errors_keep_details() {
    let error = Error::conflict("email already exists")
        .with_details(json!({"collection": "partners", "field": "email"}));
    let (_, header, body) = render(&error).await;
    assert!(header.is_none());
    assert_eq!(body["details"]["field"], json!("email"));
    assert!(body.get("errors").is_none());
}

#[rstest]
#[case(ErrorPayloadTooLarge("too big"), "Request payload too large")]
#[case(ErrorNotFound("no route"), "Malformed request")]
fn actix_client_errors_become_validation_errors(
    #[case] err: actix_web::Error,
    #[case] message: &str,
) {
    let mapped = Error::from(err);
    assert_eq!(mapped.kind(), ErrorKind::Validation);
    assert_eq!(mapped.message(), message);
}
