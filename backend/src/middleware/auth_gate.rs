//! Credential gate mounted on protected scopes.
//!
//! The middleware reads the credential from the `admin_token` cookie, the
//! legacy `token` cookie or an `Authorization: Bearer` header, asks
//! [`AuthGateService`](crate::domain::AuthGateService) for a decision and
//! stores the resulting [`GateOutcome`] in the request extensions. Handlers
//! read it back through the `Authenticated` and `MaybeAuthenticated`
//! extractors. Rejections short-circuit with the error envelope before any
//! handler or request extractor runs.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, HttpMessage, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::{
    AccessPolicy, AuthMode, CredentialSources, Error as DomainError, Permission, Role,
};
use crate::inbound::http::state::HttpState;

/// Cookie set at login.
pub const PRIMARY_COOKIE: &str = "admin_token";
/// Cookie name used by older storefront clients.
pub const LEGACY_COOKIE: &str = "token";

/// Gate configuration for one scope or resource.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use marketplace::domain::Permission;
/// use marketplace::middleware::AuthGate;
///
/// let _app = App::new().service(
///     web::scope("/api/admin/bikes").wrap(AuthGate::required().permission(Permission::ManageBikes)),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    mode: AuthMode,
    policy: AccessPolicy,
}

impl AuthGate {
    /// Reject requests without a valid credential.
    pub fn required() -> Self {
        Self::default()
    }

    /// Attach an identity when one resolves; otherwise continue anonymously.
    pub fn optional() -> Self {
        Self {
            mode: AuthMode::Optional,
            policy: AccessPolicy::any(),
        }
    }

    #[must_use]
    pub fn permission(mut self, permission: Permission) -> Self {
        self.policy = self.policy.permission(permission);
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.policy = self.policy.roles(roles);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
            mode: self.mode,
            policy: Rc::new(self.policy.clone()),
        }))
    }
}

/// Service wrapper produced by [`AuthGate`].
pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
    mode: AuthMode,
    policy: Rc<AccessPolicy>,
}

fn credential(req: &ServiceRequest) -> Option<String> {
    let primary = req.cookie(PRIMARY_COOKIE);
    let legacy = req.cookie(LEGACY_COOKIE);
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    CredentialSources {
        primary_cookie: primary.as_ref().map(|cookie| cookie.value()),
        legacy_cookie: legacy.as_ref().map(|cookie| cookie.value()),
        authorization_header: header,
    }
    .credential()
    .map(str::to_owned)
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let policy = Rc::clone(&self.policy);
        let mode = self.mode;
        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<HttpState>>().cloned() else {
                error!(path = req.path(), "auth gate mounted without HTTP state");
                let err = DomainError::internal("authentication state missing");
                return Ok(req.error_response(err).map_into_right_body());
            };
            let token = credential(&req);
            match state.auth_gate.resolve(token.as_deref(), mode, &policy).await {
                Ok(outcome) => {
                    req.extensions_mut().insert(outcome);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}
