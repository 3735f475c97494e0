//! Operator authentication endpoints.
//!
//! ```text
//! POST /api/admin/auth/login {"email":"ops@example.com","password":"..."}
//! POST /api/admin/auth/logout
//! GET  /api/admin/auth/me
//! ```
//!
//! Login sets the `admin_token` cookie and also returns the token so
//! non-browser clients can send it as a bearer header.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::Cookie;
use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::envelope;
use super::identity::Authenticated;
use super::schemas::email;
use super::state::{CookiePolicy, HttpState};
use super::validated::Validated;
use crate::domain::validation::{FieldRule, FieldSet, SchemaDescriptor, StringRule};
use crate::domain::{AccountView, Error, FieldError, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::middleware::{LEGACY_COOKIE, PRIMARY_COOKIE};
use crate::route_schema;

route_schema!(LoginSchema => SchemaDescriptor::new().body(
    FieldSet::new()
        .field("email", email())
        .field("password", FieldRule::string(StringRule::new().min_len(1).max_len(128)))
));

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

/// Body returned by a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: AccountView,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let path = match err {
        LoginValidationError::EmptyEmail => "email",
        LoginValidationError::EmptyPassword => "password",
    };
    Error::validation(vec![FieldError::new(path, err.to_string())])
}

fn credential_cookie(policy: CookiePolicy, token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(PRIMARY_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(policy.secure)
        .same_site(policy.same_site)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

/// Verify credentials and issue a signed token.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    request: Validated<LoginSchema>,
) -> ApiResult<HttpResponse> {
    let body: LoginRequest = request.body_as()?;
    let credentials = LoginCredentials::try_from(body).map_err(map_login_validation_error)?;
    let session = state.login.authenticate(&credentials).await?;

    let max_age = (session.expires_at - state.clock.utc()).num_seconds().max(0);
    let cookie = credential_cookie(state.cookies, session.token.clone(), max_age);
    let mut response = envelope::ok(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        account: session.account,
    });
    response.add_cookie(&cookie).map_err(|err| {
        error!(error = %err, "failed to encode credential cookie");
        Error::internal("failed to encode credential cookie")
    })?;
    Ok(response)
}

/// Clear both credential cookies. Always succeeds.
#[post("/logout")]
pub async fn logout() -> ApiResult<HttpResponse> {
    let mut response = envelope::message("Logged out");
    for name in [PRIMARY_COOKIE, LEGACY_COOKIE] {
        let cookie = Cookie::build(name, "").path("/").finish();
        response.add_removal_cookie(&cookie).map_err(|err| {
            Error::internal("failed to encode cookie removal").with_details(json!({
                "cookie": name,
                "reason": err.to_string(),
            }))
        })?;
    }
    Ok(response)
}

/// Current operator's account.
#[get("/me")]
pub async fn me(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<HttpResponse> {
    let account = state.accounts.get(caller.identity().subject_id()).await?;
    Ok(envelope::ok(account))
}

#[cfg(test)]
mod tests;
