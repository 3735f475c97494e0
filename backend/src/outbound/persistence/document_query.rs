//! Translation of [`Filter`] and sort options into SQL over the `documents`
//! table.
//!
//! Conditions address `body -> field`. Field names and values are always
//! bound parameters, never spliced into the SQL text.
//!
//! Matching follows [`Filter::matches`]: numbers compare numerically,
//! RFC 3339 bounds compare chronologically and text search ignores case.

use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Jsonb, Nullable, Text, Timestamptz};
use serde_json::Value;

use super::schema::documents;
use crate::domain::ports::{Clause, Condition, Filter, SortOrder};

/// Guards a `::timestamptz` cast; other strings never reach it.
const TIMESTAMP_SHAPE: &str = r" ~ '^\d{4}-\d{2}-\d{2}T'";

/// Boolean expression over one `documents` row.
pub(super) type Predicate = Box<dyn BoxableExpression<documents::table, Pg, SqlType = Bool>>;

/// Boxed query selecting document bodies.
pub(super) type BodyQuery = documents::BoxedQuery<'static, Pg, Jsonb>;

/// One predicate per clause; a row matches when all of them hold.
pub(super) fn filter_predicates(filter: &Filter) -> Vec<Predicate> {
    filter.clauses().iter().map(clause_predicate).collect()
}

fn clause_predicate(clause: &Clause) -> Predicate {
    match clause {
        Clause::Field { field, condition } => condition_predicate(field, condition),
        Clause::Any(alternatives) => any_of(
            alternatives
                .iter()
                .map(|(field, condition)| condition_predicate(field, condition)),
        ),
    }
}

fn any_of(predicates: impl Iterator<Item = Predicate>) -> Predicate {
    predicates
        .reduce(|left, right| -> Predicate { Box::new(left.or(right)) })
        .unwrap_or_else(|| Box::new(sql::<Bool>("FALSE")))
}

fn condition_predicate(field: &str, condition: &Condition) -> Predicate {
    match condition {
        Condition::Equals(Value::Null) => Box::new(
            sql::<Bool>("(body -> ")
                .bind::<Text, _>(field.to_owned())
                .sql(" IS NULL OR body -> ")
                .bind::<Text, _>(field.to_owned())
                .sql(" = 'null'::jsonb)"),
        ),
        // jsonb equality compares numbers by value, so 5 matches 5.0.
        Condition::Equals(expected) => Box::new(
            sql::<Bool>("(body -> ")
                .bind::<Text, _>(field.to_owned())
                .sql(" = ")
                .bind::<Jsonb, _>(expected.clone())
                .sql(")"),
        ),
        Condition::OneOf(options) => any_of(
            options
                .iter()
                .map(|option| condition_predicate(field, &Condition::Equals(option.clone()))),
        ),
        Condition::AtLeast(bound) => bounded(field, bound, ">="),
        Condition::AtMost(bound) => bounded(field, bound, "<="),
        Condition::ContainsText(needle) => Box::new(
            sql::<Bool>("(jsonb_typeof(body -> ")
                .bind::<Text, _>(field.to_owned())
                .sql(") = 'string' AND body ->> ")
                .bind::<Text, _>(field.to_owned())
                .sql(" ILIKE ")
                .bind::<Text, _>(like_pattern(needle))
                .sql(")"),
        ),
    }
}

/// `body -> field <op> bound`, restricted to values of the bound's JSON type.
fn bounded(field: &str, bound: &Value, op: &'static str) -> Predicate {
    if let Some(instant) = bound.as_str().and_then(parse_timestamp) {
        return Box::new(
            sql::<Bool>("(CASE WHEN jsonb_typeof(body -> ")
                .bind::<Text, _>(field.to_owned())
                .sql(") = 'string' AND body ->> ")
                .bind::<Text, _>(field.to_owned())
                .sql(TIMESTAMP_SHAPE)
                .sql(" THEN (body ->> ")
                .bind::<Text, _>(field.to_owned())
                .sql(&format!(")::timestamptz {op} "))
                .bind::<Timestamptz, _>(instant)
                .sql(" ELSE FALSE END)"),
        );
    }
    Box::new(
        sql::<Bool>("(jsonb_typeof(body -> ")
            .bind::<Text, _>(field.to_owned())
            .sql(") = jsonb_typeof(")
            .bind::<Jsonb, _>(bound.clone())
            .sql(") AND body -> ")
            .bind::<Text, _>(field.to_owned())
            .sql(&format!(" {op} "))
            .bind::<Jsonb, _>(bound.clone())
            .sql(")"),
    )
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// `%needle%` with LIKE wildcards in `needle` escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Order by `sort` with missing values first when ascending, then by id.
///
/// Timestamp strings sort chronologically ahead of the plain jsonb
/// ordering, which handles numbers and other strings.
pub(super) fn ordered(query: BodyQuery, sort: Option<&(String, SortOrder)>) -> BodyQuery {
    let Some((field, order)) = sort else {
        return query.then_order_by(documents::id.asc());
    };
    let instant = sql::<Nullable<Timestamptz>>("CASE WHEN jsonb_typeof(body -> ")
        .bind::<Text, _>(field.clone())
        .sql(") = 'string' AND body ->> ")
        .bind::<Text, _>(field.clone())
        .sql(TIMESTAMP_SHAPE)
        .sql(" THEN (body ->> ")
        .bind::<Text, _>(field.clone())
        .sql(")::timestamptz END");
    let value = sql::<Nullable<Jsonb>>("(body -> ")
        .bind::<Text, _>(field.clone())
        .sql(")");
    let query = match order {
        SortOrder::Asc => query
            .then_order_by(instant.asc().nulls_first())
            .then_order_by(value.asc().nulls_first()),
        SortOrder::Desc => query
            .then_order_by(instant.desc().nulls_last())
            .then_order_by(value.desc().nulls_last()),
    };
    query.then_order_by(documents::id.asc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use rstest::rstest;
    use serde_json::json;

    fn rendered(filter: &Filter) -> String {
        let mut query = documents::table.select(documents::body).into_boxed::<Pg>();
        for predicate in filter_predicates(filter) {
            query = query.filter(predicate);
        }
        debug_query::<Pg, _>(&query).to_string()
    }

    #[rstest]
    #[case("50%_off", r"%50\%\_off%")]
    #[case(r"a\b", r"%a\\b%")]
    #[case("Ducati", "%Ducati%")]
    fn like_wildcards_are_escaped(#[case] needle: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(needle), expected);
    }

    #[rstest]
    fn field_names_are_bound_not_spliced() {
        let sql = rendered(&Filter::eq("make'; DROP TABLE documents; --", "Honda"));
        let (statement, binds) = sql.split_once(" -- binds:").expect("debug output lists binds");
        assert!(!statement.contains("DROP TABLE"));
        assert!(statement.contains("body -> $1"));
        assert!(binds.contains("DROP TABLE"));
    }

    #[rstest]
    fn timestamp_bounds_compare_as_instants() {
        let sql = rendered(
            &Filter::new().with("occurredAt", Condition::AtLeast(json!("2024-01-01T00:00:00Z"))),
        );
        assert!(sql.contains("::timestamptz >= $"));
    }

    #[rstest]
    fn empty_alternatives_match_nothing() {
        let sql = rendered(&Filter::new().with("status", Condition::OneOf(Vec::new())));
        assert!(sql.contains("FALSE"));
    }
}
