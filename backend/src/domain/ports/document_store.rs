//! Port abstraction for the document store backing every collection.
//!
//! Documents are JSON objects keyed by a string `id`. The port offers the
//! handful of operations handlers need (filtered find with sort and paging,
//! count, point reads, insert, replace, delete). Filtering is expressed with
//! [`Filter`]: in-process adapters evaluate it with [`Filter::matches`],
//! database adapters translate its [`Clause`]s into queries.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::define_port_error;

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Name of a collection plus the fields whose values must be unique in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collection {
    name: &'static str,
    unique_fields: &'static [&'static str],
}

impl Collection {
    /// Describe a collection.
    pub const fn new(name: &'static str, unique_fields: &'static [&'static str]) -> Self {
        Self {
            name,
            unique_fields,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields checked for duplicates on insert and replace. `null` and
    /// missing values never collide.
    pub fn unique_fields(&self) -> &'static [&'static str] {
        self.unique_fields
    }
}

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// Store could not be reached or initialised.
        Connection { message: String } => "document store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "document store query failed: {message}",
        /// Persisted data could not be encoded or decoded.
        Serialization { message: String } => "document store serialization failed: {message}",
        /// A unique field already holds the submitted value.
        DuplicateKey { collection: String, field: String } =>
            "duplicate value for {collection}.{field}",
    }
}

/// Predicate applied to a single document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value. Numbers compare numerically.
    Equals(Value),
    /// Field equals any of the values.
    OneOf(Vec<Value>),
    /// Field is greater than or equal to the value.
    AtLeast(Value),
    /// Field is less than or equal to the value.
    AtMost(Value),
    /// Field is a string containing the needle, ignoring case.
    ContainsText(String),
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value.filter(|candidate| !candidate.is_null()) else {
            return matches!(self, Self::Equals(Value::Null));
        };
        match self {
            Self::Equals(expected) => values_equal(value, expected),
            Self::OneOf(options) => options.iter().any(|option| values_equal(value, option)),
            Self::AtLeast(bound) => {
                matches!(compare_values(value, bound), Some(Ordering::Greater | Ordering::Equal))
            }
            Self::AtMost(bound) => {
                matches!(compare_values(value, bound), Some(Ordering::Less | Ordering::Equal))
            }
            Self::ContainsText(needle) => value
                .as_str()
                .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// One conjunct of a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `field` satisfies `condition`.
    Field { field: String, condition: Condition },
    /// At least one `(field, condition)` pair holds.
    Any(Vec<(String, Condition)>),
}

/// Conjunction of field conditions. The empty filter matches everything.
///
/// # Examples
/// ```
/// use marketplace::domain::ports::{Condition, Filter};
/// use serde_json::json;
///
/// let filter = Filter::new()
///     .with("status", Condition::Equals(json!("available")))
///     .with("askingPrice", Condition::AtMost(json!(5000)));
/// let doc = json!({"status": "available", "askingPrice": 4200}).as_object().cloned().unwrap();
/// assert!(filter.matches(&doc));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(field, Condition::Equals(value.into()))
    }

    /// Add a condition on `field`.
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.clauses.push(Clause::Field {
            field: field.into(),
            condition,
        });
        self
    }

    /// Add a clause satisfied when any of the field conditions holds.
    pub fn with_any<I, S>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = (S, Condition)>,
        S: Into<String>,
    {
        let alternatives: Vec<_> = alternatives
            .into_iter()
            .map(|(field, condition)| (field.into(), condition))
            .collect();
        if !alternatives.is_empty() {
            self.clauses.push(Clause::Any(alternatives));
        }
        self
    }

    /// Clauses in the order they were added, for adapters that translate
    /// the filter into their own query language.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether `document` satisfies every clause.
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Field { field, condition } => condition.matches(document.get(field)),
            Clause::Any(alternatives) => alternatives
                .iter()
                .any(|(field, condition)| condition.matches(document.get(field))),
        })
    }
}

/// Sort direction for [`FindOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort and paging options for [`DocumentStore::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Sort by `field` in `order`.
    pub fn sorted(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort: Some((field.into(), order)),
            ..Self::default()
        }
    }

    /// Skip `skip` documents and return at most `limit`.
    pub fn paged(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }
}

/// Order two documents by `field`. Missing values sort first.
pub fn compare_documents(left: &Document, right: &Document, field: &str) -> Ordering {
    match (left.get(field), right.get(field)) {
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Compare numbers numerically, RFC 3339 strings chronologically, other
/// strings lexically. Mixed types are incomparable.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => None,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Port for document persistence.
///
/// Writes are atomic per document. Concurrent writers to the same document
/// resolve as last-writer-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter`, sorted and paged per `options`.
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, DocumentStoreError>;

    /// Number of documents matching `filter`.
    async fn count(&self, collection: Collection, filter: &Filter)
    -> Result<u64, DocumentStoreError>;

    /// Fetch one document by identifier.
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError>;

    /// Insert a new document. It must carry a string `id`.
    async fn insert(&self, collection: Collection, document: Document)
    -> Result<(), DocumentStoreError>;

    /// Replace an existing document. Returns `false` when `id` is unknown.
    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<bool, DocumentStoreError>;

    /// Remove a document. Returns `false` when `id` is unknown.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, DocumentStoreError>;

    /// Remove every document matching `filter`, returning how many went.
    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DocumentStoreError>;
}
