//! Loosely-typed attribute maps.
//!
//! Item records arrive from form input, so numbers are often strings and
//! booleans are often `"1"`/`"0"`. The accessors here read them the way that
//! input is meant to be read instead of the way JSON types them.

use serde_json::{Map, Value};

/// Raw or enriched item record: string keys to scalar/array/nested values.
pub type Attributes = Map<String, Value>;

/// Returns true when a value counts as "not provided".
///
/// Null, `""`, `"0"`, `false`, `0` and empty arrays/objects are empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Numeric value of a JSON number or a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// True for JSON numbers and numeric strings.
pub fn is_numeric(value: &Value) -> bool {
    as_number(value).is_some()
}

/// Read helpers over [`Attributes`].
pub trait AttributesExt {
    /// Key is set and not null.
    fn has(&self, key: &str) -> bool;

    /// Key is set to a non-empty value (see [`is_empty_value`]).
    fn is_present(&self, key: &str) -> bool;

    /// String value, if the key holds a string.
    fn text(&self, key: &str) -> Option<&str>;

    /// String form of a string, number or boolean value.
    fn scalar(&self, key: &str) -> Option<String>;

    /// Lower-cased string form of a scalar value, or `default` when absent.
    fn lower_or(&self, key: &str, default: &str) -> String;

    /// Number or numeric string.
    fn number(&self, key: &str) -> Option<f64>;

    /// Integer value, truncating numeric strings like `"12"`.
    fn integer(&self, key: &str) -> Option<i64>;

    /// Scalar elements of an array value rendered as strings.
    fn string_list(&self, key: &str) -> Vec<String>;
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl AttributesExt for Attributes {
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !is_empty_value(v))
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn scalar(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    fn lower_or(&self, key: &str, default: &str) -> String {
        self.scalar(key)
            .unwrap_or_else(|| default.to_string())
            .to_lowercase()
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(as_number)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            other => as_number(other).map(|f| f as i64),
        }
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
            _ => Vec::new(),
        }
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
