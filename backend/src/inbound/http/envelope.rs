//! Success envelope shared by every JSON endpoint.
//!
//! ```json
//! {"success": true, "data": {...}}
//! {"success": true, "message": "Logged out"}
//! ```
//!
//! Failures use the same outer shape; see [`super::error`].

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn respond<T: Serialize>(status: StatusCode, data: Option<T>, message: Option<String>) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        success: true,
        data,
        message,
    })
}

/// `200 OK` carrying `data`.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, Some(data), None)
}

/// `201 Created` carrying `data`.
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::CREATED, Some(data), None)
}

/// `200 OK` carrying only a message.
pub fn message(text: impl Into<String>) -> HttpResponse {
    respond::<()>(StatusCode::OK, None, Some(text.into()))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::{Value, json};

    async fn body(response: HttpResponse) -> Value {
        let bytes = to_bytes(response.into_body()).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[actix_web::test]
    async fn data_responses_omit_message() {
        let response = created(json!({"id": 1}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body(response).await, json!({"success": true, "data": {"id": 1}}));
    }

    #[actix_web::test]
    async fn message_responses_omit_data() {
        assert_eq!(
            body(message("Review deleted")).await,
            json!({"success": true, "message": "Review deleted"})
        );
    }
}
