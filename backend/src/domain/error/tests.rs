//! Tests for domain error construction and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorKind::Validation)]
#[case(Error::unauthorized("no token"), ErrorKind::Authentication)]
#[case(Error::forbidden("nope"), ErrorKind::Authorization)]
#[case(Error::not_found("missing"), ErrorKind::NotFound)]
#[case(Error::conflict("taken"), ErrorKind::Conflict)]
#[case(Error::internal("boom"), ErrorKind::Internal)]
fn constructors_set_kind(#[case] error: Error, #[case] expected: ErrorKind) {
    assert_eq!(error.kind(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorKind::Validation, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values(base_error: Error) {
    let result = base_error.try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_has_no_trace_id_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("fixture is a valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::internal("boom") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn validation_carries_field_errors() {
    let error = Error::validation(vec![
        FieldError::new("rating", "rating must be at most 5"),
        FieldError::new("image", "image must be a valid URL"),
    ]);
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(error.field_errors().len(), 2);
    assert_eq!(error.field_errors()[1].path, "image");
}

#[rstest]
fn serialises_camel_case_and_skips_empty_parts() {
    let error = Error::conflict("vin already exists").with_details(json!({"field": "vin"}));
    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "kind": "conflict",
            "message": "vin already exists",
            "details": {"field": "vin"}
        })
    );
}

#[rstest]
fn kind_wire_names_match_serde() {
    for kind in [
        ErrorKind::Validation,
        ErrorKind::Authentication,
        ErrorKind::Authorization,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::Internal,
    ] {
        let value = serde_json::to_value(kind).expect("serialise kind");
        assert_eq!(value, json!(kind.as_str()));
    }
}

#[rstest]
#[should_panic(expected = "error messages must satisfy validation")]
fn new_panics_on_blank_message() {
    let _ = Error::new(ErrorKind::Internal, " ");
}

#[rstest]
#[should_panic(expected = "trace identifiers must satisfy validation")]
fn with_trace_id_panics_on_blank_identifier() {
    let _ = Error::internal("boom").with_trace_id("");
}
