//! Host query abstraction.
//!
//! The filter engine never executes a query itself. It only composes
//! predicates onto whatever query builder the host provides, through the
//! [`Query`] trait. [`MemoryQuery`] is the in-process implementation: it
//! records predicates and evaluates them over attribute maps.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use closet_core::{Attributes, attributes::as_number};

/// Predicate composition over a host query builder.
///
/// Builders are consumed and returned so strategies can chain them. `Clone` lets
/// the engine keep the pre-application state of a query and fall back to it
/// when a strategy fails.
pub trait Query: Clone + 'static {
    /// `field = value`.
    fn where_equals(self, field: &str, value: Value) -> Self;

    /// `field IN (values)`.
    fn where_in(self, field: &str, values: Vec<Value>) -> Self;

    /// The JSON array stored in `field` contains `value`.
    fn where_json_contains(self, field: &str, value: Value) -> Self;

    /// The JSON array stored in `field` contains at least one of `values`.
    fn where_any_json_contains(self, field: &str, values: Vec<Value>) -> Self;
}

/// One recorded predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Equals { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    JsonContains { field: String, value: Value },
    AnyJsonContains { field: String, values: Vec<Value> },
}

impl Predicate {
    pub fn field(&self) -> &str {
        match self {
            Self::Equals { field, .. }
            | Self::In { field, .. }
            | Self::JsonContains { field, .. }
            | Self::AnyJsonContains { field, .. } => field,
        }
    }

    /// Evaluates the predicate against one record. A missing field never matches.
    pub fn matches(&self, record: &Attributes) -> bool {
        let Some(stored) = record.get(self.field()) else {
            return false;
        };
        match self {
            Self::Equals { value, .. } => loosely_equal(stored, value),
            Self::In { values, .. } => values.iter().any(|v| loosely_equal(stored, v)),
            Self::JsonContains { value, .. } => json_contains(stored, value),
            Self::AnyJsonContains { values, .. } => values.iter().any(|v| json_contains(stored, v)),
        }
    }
}

/// Equality the way form-sourced records need it: `3` equals `"3"`.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn json_contains(stored: &Value, needle: &Value) -> bool {
    match (stored, needle) {
        (Value::Array(items), Value::Array(wanted)) => wanted
            .iter()
            .all(|w| items.iter().any(|item| loosely_equal(item, w))),
        (Value::Array(items), _) => items.iter().any(|item| loosely_equal(item, needle)),
        (Value::String(raw), _) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Array(_)) => json_contains(&parsed, needle),
            _ => loosely_equal(stored, needle),
        },
        _ => loosely_equal(stored, needle),
    }
}

/// Query builder that records predicates and evaluates them in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryQuery {
    predicates: Vec<Predicate>,
}

impl MemoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }

    /// True when every predicate matches.
    pub fn matches(&self, record: &Attributes) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Records that satisfy the query, in input order.
    pub fn execute<'a, I>(&self, records: I) -> Vec<&'a Attributes>
    where
        I: IntoIterator<Item = &'a Attributes>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}

impl Query for MemoryQuery {
    fn where_equals(self, field: &str, value: Value) -> Self {
        self.push(Predicate::Equals {
            field: field.to_string(),
            value,
        })
    }

    fn where_in(self, field: &str, values: Vec<Value>) -> Self {
        self.push(Predicate::In {
            field: field.to_string(),
            values,
        })
    }

    fn where_json_contains(self, field: &str, value: Value) -> Self {
        self.push(Predicate::JsonContains {
            field: field.to_string(),
            value,
        })
    }

    fn where_any_json_contains(self, field: &str, values: Vec<Value>) -> Self {
        self.push(Predicate::AnyJsonContains {
            field: field.to_string(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn equality_is_loose_across_numbers_and_strings() {
        let q = MemoryQuery::new().where_equals("category_id", json!("3"));
        assert!(q.matches(&record(json!({"category_id": 3}))));
        assert!(q.matches(&record(json!({"category_id": "3"}))));
        assert!(!q.matches(&record(json!({"category_id": 4}))));
        assert!(!q.matches(&record(json!({}))));
    }

    #[test]
    fn where_in_matches_any_listed_value() {
        let q = MemoryQuery::new().where_in("condition", vec![json!("novo"), json!("usado_bom")]);
        assert!(q.matches(&record(json!({"condition": "usado_bom"}))));
        assert!(!q.matches(&record(json!({"condition": "danificado"}))));
    }

    #[test]
    fn json_contains_reads_arrays_and_encoded_arrays() {
        let q = MemoryQuery::new().where_json_contains("colors", json!("azul"));
        assert!(q.matches(&record(json!({"colors": ["preto", "azul"]}))));
        assert!(q.matches(&record(json!({"colors": "[\"azul\"]"}))));
        assert!(q.matches(&record(json!({"colors": "azul"}))));
        assert!(!q.matches(&record(json!({"colors": ["preto"]}))));
    }

    #[test]
    fn any_json_contains_is_an_or_group() {
        let q = MemoryQuery::new().where_any_json_contains("colors", vec![json!("rosa"), json!("azul")]);
        assert!(q.matches(&record(json!({"colors": ["azul"]}))));
        assert!(!q.matches(&record(json!({"colors": ["preto", "branco"]}))));
    }

    #[test]
    fn predicates_are_and_combined() {
        let q = MemoryQuery::new()
            .where_equals("season", json!("verao"))
            .where_json_contains("colors", json!("branco"));
        let items = [
            record(json!({"id": 1, "season": "verao", "colors": ["branco"]})),
            record(json!({"id": 2, "season": "verao", "colors": ["preto"]})),
            record(json!({"id": 3, "season": "inverno", "colors": ["branco"]})),
        ];
        let hits = q.execute(&items);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["id"], json!(1));
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = MemoryQuery::new();
        assert!(q.is_unfiltered());
        assert!(q.matches(&Attributes::new()));
    }
}
