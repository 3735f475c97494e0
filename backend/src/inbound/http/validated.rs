//! Schema-driven request extractor.
//!
//! Each route declares a [`RouteSchema`] marker type (usually through
//! [`route_schema!`](crate::route_schema)) and takes `Validated<Marker>` as
//! an argument. The extractor gathers every facet of the request, runs the
//! domain validator and hands the handler the normalised view. Failures
//! become a 400 envelope listing every field error.

use std::marker::PhantomData;
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::web::Bytes;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::Error;
use crate::domain::validation::{
    RawBody, RawRequest, SchemaDescriptor, ValidatedRequest, validate_request,
};

/// Binds a route to its schema descriptor.
pub trait RouteSchema: 'static {
    fn schema() -> &'static SchemaDescriptor;
}

/// Declare a marker type whose schema is built once on first use.
///
/// ```
/// use marketplace::domain::validation::{FieldRule, FieldSet, SchemaDescriptor};
/// use marketplace::inbound::http::validated::RouteSchema;
///
/// marketplace::route_schema!(ProbeSchema => SchemaDescriptor::new()
///     .query(FieldSet::new().field("verbose", FieldRule::boolean().optional())));
///
/// assert!(ProbeSchema::schema().facet(marketplace::domain::validation::Facet::Query).is_some());
/// ```
#[macro_export]
macro_rules! route_schema {
    ($(#[$meta:meta])* $vis:vis $name:ident => $build:expr) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::inbound::http::validated::RouteSchema for $name {
            fn schema() -> &'static $crate::domain::validation::SchemaDescriptor {
                static SCHEMA: ::std::sync::LazyLock<$crate::domain::validation::SchemaDescriptor> =
                    ::std::sync::LazyLock::new(|| $build);
                &SCHEMA
            }
        }
    };
}

/// Normalised request for the route described by `S`.
pub struct Validated<S> {
    request: ValidatedRequest,
    _schema: PhantomData<S>,
}

impl<S> Validated<S> {
    pub fn into_inner(self) -> ValidatedRequest {
        self.request
    }
}

impl<S> Deref for Validated<S> {
    type Target = ValidatedRequest;

    fn deref(&self) -> &Self::Target {
        &self.request
    }
}

fn raw_request(req: &HttpRequest, body: &[u8]) -> RawRequest {
    let query = url::form_urlencoded::parse(req.query_string().as_bytes())
        .into_owned()
        .collect();
    let params = req
        .match_info()
        .iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();
    let cookies = req
        .cookies()
        .map(|jar| {
            jar.iter()
                .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
                .collect()
        })
        .unwrap_or_default();
    RawRequest {
        body: RawBody::from_bytes(body),
        query,
        params,
        cookies,
    }
}

impl<S: RouteSchema> FromRequest for Validated<S> {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let body = Bytes::from_request(&req, payload);
        Box::pin(async move {
            let bytes = body.await.map_err(Error::from)?;
            let raw = raw_request(&req, &bytes);
            let request = validate_request(S::schema(), &raw)?;
            Ok(Self {
                request,
                _schema: PhantomData,
            })
        })
    }
}
