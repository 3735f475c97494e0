//! Handler tests for login, logout and the current-operator endpoint.

use std::collections::BTreeSet;
use std::sync::Arc;

use actix_web::{App, test, web};
use chrono::Duration;
use mockable::Clock;
use rstest::rstest;
use serde_json::{Value, json};
use uuid::Uuid;

use super::*;
use crate::domain::ports::{LoginSession, MockLoginService};
use crate::domain::{Permission, Role};
use crate::test_support::{Harness, TEST_PASSWORD};

fn account_view(harness: &Harness) -> AccountView {
    let now = harness.clock.utc();
    AccountView {
        id: Uuid::from_u128(7),
        email: "ops@example.com".into(),
        name: "Ops".into(),
        role: Role::Manager,
        permissions: BTreeSet::from([Permission::ManageBikes]),
        is_active: true,
        last_login_at: Some(now),
        created_at: now,
        updated_at: now,
    }
}

async fn post_login(state: HttpState, body: Value) -> actix_web::dev::ServiceResponse {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(web::scope("/api/admin/auth").service(login)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/admin/auth/login")
        .set_json(body)
        .to_request();
    test::call_service(&app, req).await
}

#[rstest]
#[actix_web::test]
async fn successful_login_sets_the_credential_cookie() {
    let harness = Harness::new();
    let session = LoginSession {
        token: "signed.jwt.value".into(),
        expires_at: harness.clock.utc() + Duration::hours(24),
        account: account_view(&harness),
    };
    let mut login_service = MockLoginService::new();
    login_service
        .expect_authenticate()
        .withf(|credentials| credentials.email() == "ops@example.com")
        .times(1)
        .return_once(move |_| Ok(session));
    let state = harness.state.clone().with_login(Arc::new(login_service));

    let res = post_login(state, json!({"email": " OPS@example.com ", "password": "pw"})).await;

    assert_eq!(res.status().as_u16(), 200);
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "admin_token")
        .expect("credential cookie");
    assert_eq!(cookie.value(), "signed.jwt.value");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::hours(24))
    );
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token"], "signed.jwt.value");
    assert!(body["data"]["account"].get("passwordHash").is_none());
}

#[rstest]
#[actix_web::test]
async fn rejected_credentials_use_the_error_envelope() {
    let harness = Harness::new();
    let mut login_service = MockLoginService::new();
    login_service
        .expect_authenticate()
        .times(1)
        .return_once(|_| Err(Error::unauthorized("Invalid credentials")));
    let state = harness.state.clone().with_login(Arc::new(login_service));

    let res = post_login(state, json!({"email": "ops@example.com", "password": "nope"})).await;

    assert_eq!(res.status().as_u16(), 401);
    assert!(res.response().cookies().next().is_none());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "authentication_error");
    assert_eq!(body["message"], "Invalid credentials");
}

#[rstest]
#[case(json!({"password": "pw"}), "email")]
#[case(json!({"email": "not-an-email", "password": "pw"}), "email")]
#[case(json!({"email": "ops@example.com", "password": ""}), "password")]
#[actix_web::test]
async fn malformed_logins_never_reach_the_service(#[case] body: Value, #[case] path: &str) {
    let harness = Harness::new();
    let mut login_service = MockLoginService::new();
    login_service.expect_authenticate().never();
    let state = harness.state.clone().with_login(Arc::new(login_service));

    let res = post_login(state, body).await;

    assert_eq!(res.status().as_u16(), 400);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["errors"][0]["path"], path);
}

#[rstest]
#[actix_web::test]
async fn logout_clears_both_cookies() {
    let app = test::init_service(App::new().service(logout)).await;
    let req = test::TestRequest::post().uri("/logout").to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status().as_u16(), 200);
    let mut cleared: Vec<String> = res
        .response()
        .cookies()
        .filter(|cookie| cookie.value().is_empty())
        .map(|cookie| cookie.name().to_owned())
        .collect();
    cleared.sort();
    assert_eq!(cleared, ["admin_token", "token"]);
}

#[rstest]
#[actix_web::test]
async fn real_login_then_me_round_trip() {
    let harness = Harness::new();
    let account = harness
        .seed_account("ops@example.com", Role::Manager, &[], true)
        .await;
    let app = test::init_service(crate::inbound::http::routes::application(
        harness.data(),
        web::Data::new(crate::inbound::http::health::HealthState::new()),
    ))
    .await;

    let login_req = test::TestRequest::post()
        .uri("/api/admin/auth/login")
        .set_json(json!({"email": "ops@example.com", "password": TEST_PASSWORD}))
        .to_request();
    let login_res = test::call_service(&app, login_req).await;
    assert_eq!(login_res.status().as_u16(), 200);
    let cookie = login_res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "admin_token")
        .expect("credential cookie")
        .into_owned();

    let me_req = test::TestRequest::get()
        .uri("/api/admin/auth/me")
        .cookie(cookie)
        .to_request();
    let me_res = test::call_service(&app, me_req).await;
    assert_eq!(me_res.status().as_u16(), 200);
    let body: Value = test::read_body_json(me_res).await;
    assert_eq!(body["data"]["id"], account.id.to_string());
    assert!(body["data"]["lastLoginAt"].is_string());
}
