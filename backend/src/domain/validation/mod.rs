//! Declarative request schemas and their interpreter.
//!
//! A [`SchemaDescriptor`] describes up to four request facets (body, query,
//! path parameters, cookies). Each facet is an ordered [`FieldSet`] mapping a
//! field name to a [`FieldRule`], itself a tagged [`RuleKind`] tree with
//! constraints and nested children. Descriptors are built once per route and
//! shared read-only across requests.
//!
//! [`validate_request`] interprets a descriptor against a [`RawRequest`] and
//! returns either a [`ValidatedRequest`] or a [`ValidationFailure`]. It is a
//! pure function: it never performs I/O.
//!
//! Per field, checks run in a fixed order and stop at the first failure:
//! presence, type, enumeration, numeric bounds, length bounds, pattern or
//! format, then nested children. Failures are collected across fields.

mod interpreter;
mod rule;

pub use interpreter::{validate_request, RawBody, RawFacet, RawRequest};
pub use rule::{
    ArrayRule, FieldRule, FieldSet, NumberRule, Pattern, RuleKind, StringFormat, StringRule,
};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::{Error, FieldError};

/// One of the four request parts a descriptor can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Body,
    Query,
    Params,
    Cookies,
}

impl Facet {
    /// Key used for the facet in the normalised output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Params => "params",
            Self::Cookies => "cookies",
        }
    }

    /// Whether raw values arrive as strings and must be coerced.
    pub fn is_textual(self) -> bool {
        !matches!(self, Self::Body)
    }
}

/// What to do with a body that is present but not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedBodyPolicy {
    /// Treat the body as `{}` and let presence checks report missing
    /// fields. This matches the behaviour existing API clients rely on.
    #[default]
    TreatAsEmpty,
    /// Fail with a single `body` field error before any field is checked.
    Reject,
}

/// Immutable per-route description of the expected request shape.
///
/// # Examples
/// ```
/// use marketplace::domain::validation::{FieldRule, FieldSet, NumberRule, SchemaDescriptor};
///
/// let schema = SchemaDescriptor::new().query(
///     FieldSet::new().field("page", FieldRule::number(NumberRule::integer().min(1.0)).optional()),
/// );
/// assert!(schema.facet(marketplace::domain::validation::Facet::Query).is_some());
/// assert!(schema.facet(marketplace::domain::validation::Facet::Body).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaDescriptor {
    body: Option<FieldSet>,
    query: Option<FieldSet>,
    params: Option<FieldSet>,
    cookies: Option<FieldSet>,
    malformed_body: MalformedBodyPolicy,
}

impl SchemaDescriptor {
    /// Descriptor with no facets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain the JSON body.
    pub fn body(mut self, fields: FieldSet) -> Self {
        self.body = Some(fields);
        self
    }

    /// Constrain the query string.
    pub fn query(mut self, fields: FieldSet) -> Self {
        self.query = Some(fields);
        self
    }

    /// Constrain router path parameters.
    pub fn params(mut self, fields: FieldSet) -> Self {
        self.params = Some(fields);
        self
    }

    /// Constrain cookies.
    pub fn cookies(mut self, fields: FieldSet) -> Self {
        self.cookies = Some(fields);
        self
    }

    /// Choose how unparsable bodies are handled.
    pub fn malformed_body(mut self, policy: MalformedBodyPolicy) -> Self {
        self.malformed_body = policy;
        self
    }

    /// Field set for `facet`, if the descriptor constrains it.
    pub fn facet(&self, facet: Facet) -> Option<&FieldSet> {
        match facet {
            Facet::Body => self.body.as_ref(),
            Facet::Query => self.query.as_ref(),
            Facet::Params => self.params.as_ref(),
            Facet::Cookies => self.cookies.as_ref(),
        }
    }

    /// Configured malformed-body policy.
    pub fn malformed_body_policy(&self) -> MalformedBodyPolicy {
        self.malformed_body
    }
}

/// Ordered field errors produced when a request does not match its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub message: String,
    pub field_errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub(crate) fn new(field_errors: Vec<FieldError>) -> Self {
        Self {
            message: "Validation failed".to_owned(),
            field_errors,
        }
    }
}

impl From<ValidationFailure> for Error {
    fn from(value: ValidationFailure) -> Self {
        Error::invalid_request(value.message).with_field_errors(value.field_errors)
    }
}

/// Normalised, schema-conformant view of a request.
///
/// Only facets present in the descriptor are populated, and each holds only
/// declared fields with coercions applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Map<String, Value>>,
}

impl ValidatedRequest {
    /// Normalised facet, if the descriptor declared it.
    pub fn facet(&self, facet: Facet) -> Option<&Map<String, Value>> {
        match facet {
            Facet::Body => self.body.as_ref(),
            Facet::Query => self.query.as_ref(),
            Facet::Params => self.params.as_ref(),
            Facet::Cookies => self.cookies.as_ref(),
        }
    }

    pub(crate) fn set_facet(&mut self, facet: Facet, value: Map<String, Value>) {
        let slot = match facet {
            Facet::Body => &mut self.body,
            Facet::Query => &mut self.query,
            Facet::Params => &mut self.params,
            Facet::Cookies => &mut self.cookies,
        };
        *slot = Some(value);
    }

    /// Deserialise the body facet into a typed DTO.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.facet_as(Facet::Body)
    }

    /// Deserialise the query facet into a typed DTO.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.facet_as(Facet::Query)
    }

    /// Deserialise the path parameters into a typed DTO.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.facet_as(Facet::Params)
    }

    fn facet_as<T: DeserializeOwned>(&self, facet: Facet) -> Result<T, Error> {
        let map = self.facet(facet).cloned().unwrap_or_default();
        serde_json::from_value(Value::Object(map)).map_err(|error| {
            warn!(facet = facet.as_str(), %error, "validated facet does not match DTO");
            Error::invalid_request(format!(
                "{} does not match the expected shape",
                facet.as_str()
            ))
        })
    }
}

#[cfg(test)]
mod tests;
