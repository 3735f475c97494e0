//! Rule tree types used by [`SchemaDescriptor`](super::SchemaDescriptor).

use regex::Regex;
use serde_json::Value;

/// Ordered mapping from field name to rule.
///
/// Order matters: field errors are reported in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<(String, FieldRule)>,
}

impl FieldSet {
    /// Empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Redeclaring a name replaces the earlier rule.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        self.fields.retain(|(existing, _)| existing != &name);
        self.fields.push((name, rule));
        self
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Rule declared for `name`.
    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, rule)| rule)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Constraint on one field: its kind plus presence handling.
#[derive(Debug, Clone)]
pub struct FieldRule {
    kind: RuleKind,
    required: bool,
    default: Option<Value>,
}

impl FieldRule {
    fn of(kind: RuleKind) -> Self {
        Self {
            kind,
            required: true,
            default: None,
        }
    }

    /// Required string field.
    pub fn string(rule: StringRule) -> Self {
        Self::of(RuleKind::String(rule))
    }

    /// Required numeric field.
    pub fn number(rule: NumberRule) -> Self {
        Self::of(RuleKind::Number(rule))
    }

    /// Required boolean field.
    pub fn boolean() -> Self {
        Self::of(RuleKind::Boolean)
    }

    /// Required string restricted to `values`.
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(RuleKind::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// Required nested object.
    pub fn object(fields: FieldSet) -> Self {
        Self::of(RuleKind::Object(fields))
    }

    /// Required array.
    pub fn array(rule: ArrayRule) -> Self {
        Self::of(RuleKind::Array(rule))
    }

    /// Allow the field to be absent or `null`.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value inserted when an optional field is absent.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Whether the field must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Value inserted for absent optional fields.
    pub fn fallback(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Tagged rule kind.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }
}

/// Tagged variant describing what a field must look like.
#[derive(Debug, Clone)]
pub enum RuleKind {
    String(StringRule),
    Number(NumberRule),
    Boolean,
    Enum(Vec<String>),
    Object(FieldSet),
    Array(ArrayRule),
}

/// Named string formats checked after length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    /// Absolute `http` or `https` URL.
    Url,
    Uuid,
}

/// Regular expression plus the message reported when it does not match.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    message: String,
}

impl Pattern {
    /// Compile `pattern`.
    ///
    /// # Panics
    ///
    /// Panics when `pattern` is not a valid regular expression. Descriptors
    /// are built from literals, so this only fires on a programming error.
    pub fn new(pattern: &str, message: impl Into<String>) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|error| panic!("schema pattern {pattern:?} failed to compile: {error}"));
        Self {
            regex,
            message: message.into(),
        }
    }

    pub(crate) fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

/// String constraints. Lengths count characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct StringRule {
    pub(crate) min_len: Option<usize>,
    pub(crate) max_len: Option<usize>,
    pub(crate) pattern: Option<Pattern>,
    pub(crate) format: Option<StringFormat>,
    pub(crate) trim: bool,
    pub(crate) lowercase: bool,
}

impl StringRule {
    /// Unconstrained string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum length in characters (inclusive).
    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    /// Maximum length in characters (inclusive).
    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    /// Regular expression the value must match.
    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Named format the value must satisfy.
    pub fn format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Strip surrounding whitespace before any check.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Lower-case the normalised value.
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }
}

/// Numeric constraints. Bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct NumberRule {
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) integer: bool,
}

impl NumberRule {
    /// Any finite number.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole numbers only.
    pub fn integer() -> Self {
        Self {
            integer: true,
            ..Self::default()
        }
    }

    /// Inclusive lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

/// Array constraints and the rule every item must satisfy.
#[derive(Debug, Clone)]
pub struct ArrayRule {
    pub(crate) items: Box<FieldRule>,
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
}

impl ArrayRule {
    /// Array whose items follow `items`.
    pub fn of(items: FieldRule) -> Self {
        Self {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Minimum item count (inclusive).
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    /// Maximum item count (inclusive).
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}
