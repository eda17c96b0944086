use serde_json::Value;

use closet_core::attributes::{as_number, is_numeric};

use crate::query::Query;
use crate::strategy::FilterStrategy;

/// `category_id` equals one id, or is one of several ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryFilter;

impl<Q: Query> FilterStrategy<Q> for CategoryFilter {
    fn name(&self) -> &str {
        "category"
    }

    fn description(&self) -> &str {
        "Filters items by one category id or a list of category ids"
    }

    fn is_valid_value(&self, value: &Value) -> bool {
        match value {
            Value::Array(ids) => !ids.is_empty() && ids.iter().all(is_numeric),
            other => as_number(other).is_some_and(|id| id > 0.0),
        }
    }

    fn apply(&self, query: Q, value: &Value) -> anyhow::Result<Q> {
        Ok(match value {
            Value::Array(ids) => query.where_in("category_id", ids.clone()),
            id => query.where_equals("category_id", id.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{MemoryQuery, Predicate};
    use serde_json::json;

    fn valid(value: Value) -> bool {
        FilterStrategy::<MemoryQuery>::is_valid_value(&CategoryFilter, &value)
    }

    #[test]
    fn accepts_positive_ids_and_numeric_lists() {
        assert!(valid(json!(3)));
        assert!(valid(json!("12")));
        assert!(valid(json!([1, "2"])));
        assert!(!valid(json!(0)));
        assert!(!valid(json!(-4)));
        assert!(!valid(json!("camisa")));
        assert!(!valid(json!([])));
        assert!(!valid(json!([1, "x"])));
        assert!(!valid(json!(null)));
    }

    #[test]
    fn list_becomes_membership_predicate() {
        let q = CategoryFilter.apply(MemoryQuery::new(), &json!([1, 2])).unwrap();
        assert_eq!(
            q.predicates(),
            &[Predicate::In {
                field: "category_id".into(),
                values: vec![json!(1), json!(2)],
            }]
        );
    }
}
