//! Extractors exposing the caller resolved by the auth gate.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};

use crate::domain::{AuthFailure, Error, GateOutcome, Identity};

fn resolved_identity(req: &HttpRequest) -> Option<Identity> {
    req.extensions()
        .get::<GateOutcome>()
        .and_then(GateOutcome::identity)
        .cloned()
}

/// Caller on a route behind a required gate.
///
/// Resolves to 401 when no identity was attached, which only happens if the
/// route was mounted without a gate.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl Authenticated {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            resolved_identity(req)
                .map(Self)
                .ok_or_else(|| AuthFailure::NoCredential.into()),
        )
    }
}

/// Caller on a route behind an optional gate; `None` for anonymous visitors.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthenticated(pub Option<Identity>);

impl MaybeAuthenticated {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self(resolved_identity(req))))
    }
}
