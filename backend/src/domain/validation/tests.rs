//! Tests for the schema interpreter.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

fn review_schema() -> SchemaDescriptor {
    SchemaDescriptor::new().body(
        FieldSet::new()
            .field("name", FieldRule::string(StringRule::new().trim().min_len(1).max_len(80)))
            .field(
                "rating",
                FieldRule::number(NumberRule::integer().min(1.0).max(5.0)),
            )
            .field(
                "description",
                FieldRule::string(StringRule::new().trim().min_len(1).max_len(2000)),
            )
            .field(
                "image",
                FieldRule::string(StringRule::new().format(StringFormat::Url)).optional(),
            ),
    )
}

fn listing_schema() -> SchemaDescriptor {
    SchemaDescriptor::new().query(
        FieldSet::new()
            .field(
                "page",
                FieldRule::number(NumberRule::integer().min(1.0)).default_value(1),
            )
            .field(
                "limit",
                FieldRule::number(NumberRule::integer().min(1.0).max(100.0)).default_value(12),
            )
            .field(
                "order",
                FieldRule::one_of(["asc", "desc"]).default_value("desc"),
            )
            .field("featured", FieldRule::boolean().optional())
            .field(
                "tag",
                FieldRule::array(ArrayRule::of(FieldRule::string(StringRule::new()))).optional(),
            ),
    )
}

fn body(value: serde_json::Value) -> RawRequest {
    RawRequest {
        body: RawBody::Json(value),
        ..RawRequest::default()
    }
}

fn query(pairs: &[(&str, &str)]) -> RawRequest {
    RawRequest {
        query: pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect(),
        ..RawRequest::default()
    }
}

fn paths(failure: &ValidationFailure) -> Vec<&str> {
    failure
        .field_errors
        .iter()
        .map(|error| error.path.as_str())
        .collect()
}

#[fixture]
fn review() -> SchemaDescriptor {
    review_schema()
}

#[rstest]
fn valid_review_is_normalised(review: SchemaDescriptor) {
    let validated = validate_request(
        &review,
        &body(json!({
            "name": "  Ana  ",
            "rating": 5,
            "description": "Great bike",
            "spam": true
        })),
    )
    .expect("review is valid");

    let normalised = validated.body.expect("body facet present");
    assert_eq!(normalised.get("name"), Some(&json!("Ana")));
    assert_eq!(normalised.get("rating"), Some(&json!(5)));
    assert!(normalised.get("spam").is_none());
    assert!(normalised.get("image").is_none());
    assert!(validated.query.is_none());
}

#[rstest]
fn review_failure_reports_every_bad_field_in_order(review: SchemaDescriptor) {
    let failure = validate_request(
        &review,
        &body(json!({
            "name": "Ana",
            "rating": 6,
            "description": "",
            "image": "not a url"
        })),
    )
    .expect_err("review is invalid");

    assert_eq!(failure.message, "Validation failed");
    assert_eq!(paths(&failure), vec!["rating", "description", "image"]);
    assert_eq!(failure.field_errors[0].message, "rating must be at most 5");
    assert_eq!(
        failure.field_errors[1].message,
        "description must be at least 1 characters"
    );
    assert_eq!(failure.field_errors[2].message, "image must be a valid URL");
}

#[rstest]
#[case(json!(5), true)]
#[case(json!(1), true)]
#[case(json!(0), false)]
#[case(json!(6), false)]
#[case(json!(4.5), false)]
fn numeric_bounds_are_inclusive(review: SchemaDescriptor, #[case] rating: serde_json::Value, #[case] ok: bool) {
    let result = validate_request(
        &review,
        &body(json!({"name": "Ana", "rating": rating, "description": "ok"})),
    );
    assert_eq!(result.is_ok(), ok);
}

#[rstest]
fn omitted_required_field_yields_exactly_one_error(review: SchemaDescriptor) {
    let failure = validate_request(&review, &body(json!({"name": "Ana", "description": "ok"})))
        .expect_err("rating missing");
    assert_eq!(failure.field_errors.len(), 1);
    assert_eq!(failure.field_errors[0].path, "rating");
    assert_eq!(failure.field_errors[0].message, "rating is required");
}

#[rstest]
fn body_strings_are_not_coerced(review: SchemaDescriptor) {
    let failure = validate_request(
        &review,
        &body(json!({"name": "Ana", "rating": "5", "description": "ok"})),
    )
    .expect_err("string rating rejected in body");
    assert_eq!(failure.field_errors[0].message, "rating must be a number");
}

#[rstest]
fn null_is_treated_as_absent(review: SchemaDescriptor) {
    let validated = validate_request(
        &review,
        &body(json!({"name": "Ana", "rating": 3, "description": "ok", "image": null})),
    )
    .expect("null optional accepted");
    assert!(validated.body.expect("body").get("image").is_none());
}

#[rstest]
fn query_strings_coerce_to_numbers() {
    let validated = validate_request(&listing_schema(), &query(&[("limit", "5")]))
        .expect("query is valid");
    let normalised = validated.query.expect("query facet present");
    assert_eq!(normalised.get("limit"), Some(&json!(5)));
    assert_eq!(normalised.get("page"), Some(&json!(1)));
    assert_eq!(normalised.get("order"), Some(&json!("desc")));
}

#[rstest]
#[case("101", "limit must be at most 100")]
#[case("0", "limit must be at least 1")]
#[case("abc", "limit must be a number")]
#[case("2.5", "limit must be an integer")]
fn query_number_errors(#[case] raw: &str, #[case] message: &str) {
    let failure = validate_request(&listing_schema(), &query(&[("limit", raw)]))
        .expect_err("limit is invalid");
    assert_eq!(failure.field_errors, vec![FieldError::new("limit", message)]);
}

#[rstest]
fn empty_query_value_falls_back_to_default() {
    let validated = validate_request(&listing_schema(), &query(&[("page", "")]))
        .expect("empty page uses default");
    assert_eq!(validated.query.expect("query")["page"], json!(1));
}

#[rstest]
#[case("true", true)]
#[case("1", true)]
#[case("false", false)]
#[case("0", false)]
fn query_booleans_coerce(#[case] raw: &str, #[case] expected: bool) {
    let validated = validate_request(&listing_schema(), &query(&[("featured", raw)]))
        .expect("boolean coerces");
    assert_eq!(validated.query.expect("query")["featured"], json!(expected));
}

#[rstest]
fn enum_lists_allowed_values() {
    let failure = validate_request(&listing_schema(), &query(&[("order", "sideways")]))
        .expect_err("order invalid");
    assert_eq!(failure.field_errors[0].message, "order must be one of: asc, desc");
}

#[rstest]
fn repeated_query_keys_feed_arrays_and_scalars_take_last() {
    let validated = validate_request(
        &listing_schema(),
        &query(&[("tag", "a"), ("limit", "3"), ("tag", "b"), ("limit", "4")]),
    )
    .expect("query valid");
    let normalised = validated.query.expect("query");
    assert_eq!(normalised["tag"], json!(["a", "b"]));
    assert_eq!(normalised["limit"], json!(4));
}

#[rstest]
fn nested_paths_use_dots_and_indices() {
    let schema = SchemaDescriptor::new().body(
        FieldSet::new()
            .field(
                "specs",
                FieldRule::object(
                    FieldSet::new().field("engineCc", FieldRule::number(NumberRule::integer())),
                ),
            )
            .field(
                "images",
                FieldRule::array(
                    ArrayRule::of(FieldRule::string(StringRule::new().format(StringFormat::Url)))
                        .max_items(3),
                ),
            ),
    );
    let failure = validate_request(
        &schema,
        &body(json!({
            "specs": {"engineCc": "big"},
            "images": ["https://img.example/a.jpg", "nope"]
        })),
    )
    .expect_err("nested problems");
    assert_eq!(paths(&failure), vec!["specs.engineCc", "images[1]"]);
}

#[rstest]
fn array_length_is_checked_before_items() {
    let schema = SchemaDescriptor::new().body(FieldSet::new().field(
        "images",
        FieldRule::array(ArrayRule::of(FieldRule::string(StringRule::new())).max_items(1)),
    ));
    let failure = validate_request(&schema, &body(json!({"images": ["a", 2]})))
        .expect_err("too many items");
    assert_eq!(
        failure.field_errors,
        vec![FieldError::new("images", "images must contain at most 1 items")]
    );
}

#[rstest]
fn pattern_reports_its_own_message() {
    let schema = SchemaDescriptor::new().params(FieldSet::new().field(
        "vin",
        FieldRule::string(
            StringRule::new().pattern(Pattern::new("^[A-HJ-NPR-Z0-9]{17}$", "vin must be 17 characters")),
        ),
    ));
    let raw = RawRequest {
        params: vec![("vin".into(), "SHORT".into())],
        ..RawRequest::default()
    };
    let failure = validate_request(&schema, &raw).expect_err("vin invalid");
    assert_eq!(failure.field_errors[0].message, "vin must be 17 characters");
}

#[rstest]
fn malformed_body_is_treated_as_empty_by_default(review: SchemaDescriptor) {
    let raw = RawRequest {
        body: RawBody::from_bytes(b"{not json"),
        ..RawRequest::default()
    };
    let failure = validate_request(&review, &raw).expect_err("fields missing");
    assert_eq!(paths(&failure), vec!["name", "rating", "description"]);
}

#[rstest]
fn malformed_body_can_be_rejected_outright() {
    let schema = review_schema().malformed_body(MalformedBodyPolicy::Reject);
    let raw = RawRequest {
        body: RawBody::Malformed,
        ..RawRequest::default()
    };
    let failure = validate_request(&schema, &raw).expect_err("body rejected");
    assert_eq!(
        failure.field_errors,
        vec![FieldError::new("body", "body must be valid JSON")]
    );
}

#[rstest]
fn lowercase_applies_to_normalised_output() {
    let schema = SchemaDescriptor::new().body(FieldSet::new().field(
        "email",
        FieldRule::string(StringRule::new().trim().lowercase().format(StringFormat::Email)),
    ));
    let validated = validate_request(&schema, &body(json!({"email": " Admin@Example.COM "})))
        .expect("email valid");
    assert_eq!(validated.body.expect("body")["email"], json!("admin@example.com"));
}

#[rstest]
fn failure_converts_to_validation_error() {
    let failure = ValidationFailure::new(vec![FieldError::new("rating", "rating is required")]);
    let error: Error = failure.into();
    assert_eq!(error.kind(), crate::domain::ErrorKind::Validation);
    assert_eq!(error.message(), "Validation failed");
    assert_eq!(error.field_errors().len(), 1);
}

#[rstest]
fn typed_views_deserialise_facets() {
    #[derive(Debug, serde::Deserialize)]
    struct Listing {
        page: u32,
        limit: u32,
    }

    let validated = validate_request(&listing_schema(), &query(&[("limit", "7")]))
        .expect("query valid");
    let listing: Listing = validated.query_as().expect("typed query");
    assert_eq!((listing.page, listing.limit), (1, 7));
}

#[rstest]
#[should_panic(expected = "failed to compile")]
fn pattern_panics_on_invalid_regex() {
    let _ = Pattern::new("([unclosed", "never used");
}
