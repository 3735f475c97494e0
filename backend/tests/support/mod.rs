//! Shared helpers for marketplace integration tests.
//!
//! Integration tests compile as separate crates, so each test file pulls this
//! module in with `mod support;` and uses only what it needs.

#![allow(dead_code, reason = "each test crate uses a different subset")]

use actix_web::http::header;
use actix_web::test::TestRequest;
use serde_json::Value;

/// Attach a bearer credential to `request`.
pub fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
}

/// Minimal valid bike payload; `overrides` are merged on top.
pub fn bike_payload(overrides: Value) -> Value {
    let mut payload = serde_json::json!({
        "make": "Honda",
        "model": "CB500F",
        "year": 2019,
        "mileage": 12000,
        "condition": "good",
        "purchasePrice": 3200,
        "askingPrice": 4500,
    });
    if let (Some(target), Value::Object(extra)) = (payload.as_object_mut(), overrides) {
        target.extend(extra);
    }
    payload
}

/// Paths of the field errors in an error envelope.
pub fn error_paths(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error["path"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
