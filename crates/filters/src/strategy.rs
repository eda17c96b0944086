use serde::Serialize;
use serde_json::Value;

use crate::query::Query;

/// A named, stateless predicate that can be composed onto a query.
pub trait FilterStrategy<Q: Query>: Send + Sync {
    /// Key under which the strategy is registered and activated.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Whether `value` is acceptable input for this filter.
    fn is_valid_value(&self, value: &Value) -> bool;

    /// Closed set of accepted values, or `None` when values are dynamic.
    fn possible_values(&self) -> Option<Vec<String>> {
        None
    }

    /// Composes the predicate for `value` onto `query`.
    fn apply(&self, query: Q, value: &Value) -> anyhow::Result<Q>;
}

/// Listing entry for a registered strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    pub possible_values: Option<Vec<String>>,
}

impl StrategyInfo {
    pub fn of<Q: Query>(strategy: &dyn FilterStrategy<Q>) -> Self {
        Self {
            name: strategy.name().to_string(),
            description: strategy.description().to_string(),
            possible_values: strategy.possible_values(),
        }
    }
}

/// Scalar string in `allowed`, or a non-empty list of such strings.
pub(crate) fn one_or_many_of(value: &Value, allowed: &[&str]) -> bool {
    let accepted = |v: &Value| v.as_str().is_some_and(|s| allowed.contains(&s));
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(accepted),
        other => accepted(other),
    }
}
