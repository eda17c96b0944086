use serde_json::Value;

use closet_core::Season;

use crate::query::Query;
use crate::strategy::{FilterStrategy, one_or_many_of};

/// Item `season` is one of the season labels. The `todas` label matches every
/// season, so it adds no predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonFilter;

impl<Q: Query> FilterStrategy<Q> for SeasonFilter {
    fn name(&self) -> &str {
        "season"
    }

    fn description(&self) -> &str {
        "Filters items by season of the year"
    }

    fn is_valid_value(&self, value: &Value) -> bool {
        one_or_many_of(value, &Season::ALL_LABELS)
    }

    fn possible_values(&self) -> Option<Vec<String>> {
        Some(Season::ALL_LABELS.iter().map(|s| s.to_string()).collect())
    }

    fn apply(&self, query: Q, value: &Value) -> anyhow::Result<Q> {
        Ok(match value {
            Value::String(s) if s == Season::All.as_str() => query,
            Value::Array(seasons) => query.where_in("season", seasons.clone()),
            season => query.where_equals("season", season.clone()),
        })
    }
}
