//! Field rule building blocks shared by route schemas.
//!
//! Route modules compose these into [`SchemaDescriptor`]s with
//! [`route_schema!`](crate::route_schema); keeping them here means the same
//! field is checked the same way on every route that accepts it.

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::validation::{
    ArrayRule, FieldRule, FieldSet, NumberRule, Pattern, SchemaDescriptor, StringFormat,
    StringRule, ValidatedRequest,
};
use crate::domain::{Error, SortDirection};

const TIMESTAMP_PATTERN: &str =
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:\d{2})$";

/// Canonical UUID text.
pub fn uuid() -> FieldRule {
    FieldRule::string(StringRule::new().trim().format(StringFormat::Uuid))
}

/// Trimmed text between `min` and `max` characters.
pub fn text(min: usize, max: usize) -> FieldRule {
    FieldRule::string(StringRule::new().trim().min_len(min).max_len(max))
}

/// Trimmed, lower-cased email address.
pub fn email() -> FieldRule {
    FieldRule::string(
        StringRule::new()
            .trim()
            .lowercase()
            .max_len(254)
            .format(StringFormat::Email),
    )
}

/// Non-negative amount of money.
pub fn money() -> FieldRule {
    FieldRule::number(NumberRule::new().min(0.0))
}

/// Whole number within `min..=max`.
pub fn integer(min: f64, max: f64) -> FieldRule {
    FieldRule::number(NumberRule::integer().min(min).max(max))
}

/// RFC 3339 timestamp with an explicit offset.
pub fn timestamp(name: &str) -> FieldRule {
    FieldRule::string(StringRule::new().trim().pattern(Pattern::new(
        TIMESTAMP_PATTERN,
        format!("{name} must be an RFC 3339 timestamp"),
    )))
}

/// `http`/`https` image URLs.
pub fn image_urls() -> FieldRule {
    let url = FieldRule::string(StringRule::new().trim().format(StringFormat::Url));
    FieldRule::array(ArrayRule::of(url).max_items(20))
}

/// `asc` or `desc`.
pub fn order() -> FieldRule {
    FieldRule::one_of(SortDirection::wire_names())
}

/// `page` and `limit` query parameters.
pub fn paging(fields: FieldSet, max_limit: u32) -> FieldSet {
    fields
        .field("page", integer(1.0, f64::from(u32::MAX)).optional())
        .field("limit", integer(1.0, f64::from(max_limit)).optional())
}

/// `{id}` path parameter.
pub fn id_params() -> FieldSet {
    FieldSet::new().field("id", uuid())
}

/// Schema for routes that only take an `{id}`.
pub fn by_id() -> SchemaDescriptor {
    SchemaDescriptor::new().params(id_params())
}

/// Schema for routes that take an `{id}` and a JSON body.
pub fn by_id_with_body(body: FieldSet) -> SchemaDescriptor {
    by_id().body(body)
}

#[derive(Deserialize)]
struct IdPath {
    id: Uuid,
}

/// The validated `{id}` path parameter.
pub fn path_id(request: &ValidatedRequest) -> Result<Uuid, Error> {
    request.params_as::<IdPath>().map(|path| path.id)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::FieldError;
    use crate::domain::validation::{RawRequest, validate_request};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("2024-05-01T10:00:00Z", true)]
    #[case("2024-05-01T10:00:00.250+02:00", true)]
    #[case("2024-05-01", false)]
    #[case("yesterday", false)]
    fn timestamps_require_an_offset(#[case] value: &str, #[case] accepted: bool) {
        let schema = SchemaDescriptor::new()
            .body(FieldSet::new().field("soldAt", timestamp("soldAt")));
        let raw = RawRequest {
            body: crate::domain::validation::RawBody::Json(json!({ "soldAt": value })),
            ..RawRequest::default()
        };
        match validate_request(&schema, &raw) {
            Ok(_) => assert!(accepted),
            Err(failure) => {
                assert!(!accepted);
                assert_eq!(
                    failure.field_errors,
                    [FieldError::new("soldAt", "soldAt must be an RFC 3339 timestamp")]
                );
            }
        }
    }

    #[rstest]
    fn paging_caps_the_limit() {
        let schema = SchemaDescriptor::new().query(paging(FieldSet::new(), 50));
        let raw = RawRequest {
            query: vec![("page".into(), "2".into()), ("limit".into(), "51".into())],
            ..RawRequest::default()
        };
        let failure = validate_request(&schema, &raw).expect_err("limit above cap");
        assert_eq!(failure.field_errors.len(), 1);
        assert_eq!(failure.field_errors[0].path, "limit");
    }
}
