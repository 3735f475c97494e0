//! Recursive interpreter applying a [`SchemaDescriptor`] to a raw request.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Number, Value};
use url::Url;
use uuid::Uuid;

use super::{
    ArrayRule, Facet, FieldRule, FieldSet, MalformedBodyPolicy, NumberRule, RuleKind,
    SchemaDescriptor, StringFormat, StringRule, ValidatedRequest, ValidationFailure,
};
use crate::domain::FieldError;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Request body as received by the adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawBody {
    /// No bytes were sent.
    #[default]
    Absent,
    /// The bytes parsed as JSON.
    Json(Value),
    /// The bytes were not valid JSON.
    Malformed,
}

impl RawBody {
    /// Classify raw body bytes.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::validation::RawBody;
    ///
    /// assert_eq!(RawBody::from_bytes(b""), RawBody::Absent);
    /// assert_eq!(RawBody::from_bytes(b"{oops"), RawBody::Malformed);
    /// assert!(matches!(RawBody::from_bytes(br#"{"a":1}"#), RawBody::Json(_)));
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Absent;
        }
        serde_json::from_slice(bytes).map_or(Self::Malformed, Self::Json)
    }
}

/// Key/value pairs from a textual facet, in arrival order. Keys may repeat.
pub type RawFacet = Vec<(String, String)>;

/// Everything the validator may read from one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    pub body: RawBody,
    pub query: RawFacet,
    pub params: RawFacet,
    pub cookies: RawFacet,
}

impl RawRequest {
    fn textual(&self, facet: Facet) -> &[(String, String)] {
        match facet {
            Facet::Query => &self.query,
            Facet::Params => &self.params,
            Facet::Cookies => &self.cookies,
            Facet::Body => &[],
        }
    }
}

/// Validate `raw` against `schema`.
///
/// Facets the schema does not declare are skipped and absent from the
/// output. Undeclared fields are ignored and dropped.
///
/// # Examples
/// ```
/// use marketplace::domain::validation::{
///     validate_request, FieldRule, FieldSet, NumberRule, RawRequest, SchemaDescriptor,
/// };
/// use serde_json::json;
///
/// let schema = SchemaDescriptor::new().query(
///     FieldSet::new().field("limit", FieldRule::number(NumberRule::integer().max(5.0))),
/// );
/// let raw = RawRequest {
///     query: vec![("limit".into(), "5".into())],
///     ..RawRequest::default()
/// };
/// let validated = validate_request(&schema, &raw).unwrap();
/// assert_eq!(validated.query.unwrap()["limit"], json!(5));
/// ```
pub fn validate_request(
    schema: &SchemaDescriptor,
    raw: &RawRequest,
) -> Result<ValidatedRequest, ValidationFailure> {
    let mut errors = Vec::new();
    let mut validated = ValidatedRequest::default();

    if let Some(fields) = schema.facet(Facet::Body) {
        if let Some(input) = body_object(&raw.body, schema.malformed_body_policy(), &mut errors) {
            let normalised = check_object(fields, &input, "", false, &mut errors);
            validated.set_facet(Facet::Body, normalised);
        }
    }

    for facet in [Facet::Query, Facet::Params, Facet::Cookies] {
        if let Some(fields) = schema.facet(facet) {
            let input = textual_object(fields, raw.textual(facet));
            let normalised = check_object(fields, &input, "", true, &mut errors);
            validated.set_facet(facet, normalised);
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(ValidationFailure::new(errors))
    }
}

fn body_object(
    body: &RawBody,
    policy: MalformedBodyPolicy,
    errors: &mut Vec<FieldError>,
) -> Option<Map<String, Value>> {
    match (body, policy) {
        (RawBody::Json(Value::Object(map)), _) => Some(map.clone()),
        (RawBody::Absent, _) | (_, MalformedBodyPolicy::TreatAsEmpty) => Some(Map::new()),
        (RawBody::Malformed, MalformedBodyPolicy::Reject) => {
            errors.push(FieldError::new("body", "body must be valid JSON"));
            None
        }
        (RawBody::Json(_), MalformedBodyPolicy::Reject) => {
            errors.push(FieldError::new("body", "body must be a JSON object"));
            None
        }
    }
}

/// Gather declared keys from a textual facet. Array fields collect every
/// occurrence; scalar fields keep the last one.
fn textual_object(fields: &FieldSet, pairs: &[(String, String)]) -> Map<String, Value> {
    let mut input = Map::new();
    for (name, rule) in fields.iter() {
        let mut values = pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| Value::String(value.clone()))
            .peekable();
        if values.peek().is_none() {
            continue;
        }
        let value = match rule.kind() {
            RuleKind::Array(_) => Value::Array(values.collect()),
            _ => values.last().unwrap_or(Value::Null),
        };
        input.insert(name.to_owned(), value);
    }
    input
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

fn check_object(
    fields: &FieldSet,
    input: &Map<String, Value>,
    prefix: &str,
    textual: bool,
    errors: &mut Vec<FieldError>,
) -> Map<String, Value> {
    let mut output = Map::new();
    for (name, rule) in fields.iter() {
        let path = join_path(prefix, name);
        if let Some(value) = check_field(rule, input.get(name), &path, textual, errors) {
            output.insert(name.to_owned(), value);
        }
    }
    output
}

/// Apply one rule. Returns the normalised value, or `None` when the field is
/// absent without a default or when a problem was recorded in `errors`.
fn check_field(
    rule: &FieldRule,
    value: Option<&Value>,
    path: &str,
    textual: bool,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    let present = value.filter(|candidate| !is_absent(rule, candidate, textual));
    let Some(value) = present else {
        if rule.is_required() {
            errors.push(FieldError::new(path, format!("{path} is required")));
            return None;
        }
        return rule.fallback().cloned();
    };

    let outcome = match rule.kind() {
        RuleKind::String(string_rule) => check_string(string_rule, value, path),
        RuleKind::Number(number_rule) => check_number(number_rule, value, path, textual),
        RuleKind::Boolean => check_boolean(value, path, textual),
        RuleKind::Enum(allowed) => check_enum(allowed, value, path),
        RuleKind::Object(fields) => return check_nested_object(fields, value, path, textual, errors),
        RuleKind::Array(array_rule) => {
            return check_array(array_rule, value, path, textual, errors);
        }
    };

    match outcome {
        Ok(normalised) => Some(normalised),
        Err(message) => {
            errors.push(FieldError::new(path, message));
            None
        }
    }
}

/// `null` counts as absent everywhere. In textual facets an empty string
/// also counts as absent unless the field is a string.
fn is_absent(rule: &FieldRule, value: &Value, textual: bool) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) if textual => {
            text.is_empty() && !matches!(rule.kind(), RuleKind::String(_))
        }
        _ => false,
    }
}

fn check_string(rule: &StringRule, value: &Value, path: &str) -> Result<Value, String> {
    let Value::String(raw) = value else {
        return Err(format!("{path} must be a string"));
    };
    let text = if rule.trim { raw.trim() } else { raw.as_str() };

    let length = text.chars().count();
    if let Some(min) = rule.min_len {
        if length < min {
            return Err(format!("{path} must be at least {min} characters"));
        }
    }
    if let Some(max) = rule.max_len {
        if length > max {
            return Err(format!("{path} must be at most {max} characters"));
        }
    }

    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(text) {
            return Err(pattern.message().to_owned());
        }
    }
    if let Some(format) = rule.format {
        check_format(format, text, path)?;
    }

    let normalised = if rule.lowercase {
        text.to_lowercase()
    } else {
        text.to_owned()
    };
    Ok(Value::String(normalised))
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn check_format(format: StringFormat, text: &str, path: &str) -> Result<(), String> {
    let valid = match format {
        StringFormat::Email => email_regex().is_match(text),
        StringFormat::Url => Url::parse(text)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false),
        StringFormat::Uuid => Uuid::parse_str(text).is_ok(),
    };
    if valid {
        Ok(())
    } else {
        let what = match format {
            StringFormat::Email => "a valid email address",
            StringFormat::Url => "a valid URL",
            StringFormat::Uuid => "a valid UUID",
        };
        Err(format!("{path} must be {what}"))
    }
}

fn check_number(rule: &NumberRule, value: &Value, path: &str, textual: bool) -> Result<Value, String> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if textual => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = parsed.filter(|candidate| candidate.is_finite()) else {
        return Err(format!("{path} must be a number"));
    };
    if rule.integer && number.fract() != 0.0 {
        return Err(format!("{path} must be an integer"));
    }

    if let Some(min) = rule.min {
        if number < min {
            return Err(format!("{path} must be at least {min}"));
        }
    }
    if let Some(max) = rule.max {
        if number > max {
            return Err(format!("{path} must be at most {max}"));
        }
    }

    Ok(number_value(number))
}

/// Whole numbers normalise to JSON integers, everything else to floats.
fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < MAX_SAFE_INTEGER {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "bounded by MAX_SAFE_INTEGER and integral"
        )]
        let whole = number as i64;
        return Value::from(whole);
    }
    Number::from_f64(number).map_or(Value::Null, Value::Number)
}

fn check_boolean(value: &Value, path: &str, textual: bool) -> Result<Value, String> {
    match value {
        Value::Bool(flag) => Ok(Value::Bool(*flag)),
        Value::String(text) if textual => match text.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("{path} must be a boolean")),
        },
        _ => Err(format!("{path} must be a boolean")),
    }
}

fn check_enum(allowed: &[String], value: &Value, path: &str) -> Result<Value, String> {
    let Value::String(text) = value else {
        return Err(format!("{path} must be a string"));
    };
    if allowed.iter().any(|candidate| candidate == text) {
        Ok(Value::String(text.clone()))
    } else {
        Err(format!("{path} must be one of: {}", allowed.join(", ")))
    }
}

fn check_nested_object(
    fields: &FieldSet,
    value: &Value,
    path: &str,
    textual: bool,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    let Value::Object(map) = value else {
        errors.push(FieldError::new(path, format!("{path} must be an object")));
        return None;
    };
    let before = errors.len();
    let normalised = check_object(fields, map, path, textual, errors);
    (errors.len() == before).then_some(Value::Object(normalised))
}

fn check_array(
    rule: &ArrayRule,
    value: &Value,
    path: &str,
    textual: bool,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    let Value::Array(items) = value else {
        errors.push(FieldError::new(path, format!("{path} must be an array")));
        return None;
    };
    if let Some(min) = rule.min_items {
        if items.len() < min {
            errors.push(FieldError::new(path, format!("{path} must contain at least {min} items")));
            return None;
        }
    }
    if let Some(max) = rule.max_items {
        if items.len() > max {
            errors.push(FieldError::new(path, format!("{path} must contain at most {max} items")));
            return None;
        }
    }

    let before = errors.len();
    let normalised: Vec<Value> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let item_path = format!("{path}[{index}]");
            check_field(&rule.items, Some(item), &item_path, textual, errors)
        })
        .collect();
    (errors.len() == before).then_some(Value::Array(normalised))
}
