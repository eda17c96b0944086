use serde_json::Value;

use closet_core::ItemCondition;

use crate::query::Query;
use crate::strategy::{FilterStrategy, one_or_many_of};

/// Item `condition` is one of the condition labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionFilter;

fn labels() -> Vec<&'static str> {
    ItemCondition::ALL.iter().map(|c| c.as_str()).collect()
}

impl<Q: Query> FilterStrategy<Q> for ConditionFilter {
    fn name(&self) -> &str {
        "condition"
    }

    fn description(&self) -> &str {
        "Filters items by conservation state"
    }

    fn is_valid_value(&self, value: &Value) -> bool {
        one_or_many_of(value, &labels())
    }

    fn possible_values(&self) -> Option<Vec<String>> {
        Some(labels().into_iter().map(str::to_string).collect())
    }

    fn apply(&self, query: Q, value: &Value) -> anyhow::Result<Q> {
        Ok(match value {
            Value::Array(labels) => query.where_in("condition", labels.clone()),
            label => query.where_equals("condition", label.clone()),
        })
    }
}
