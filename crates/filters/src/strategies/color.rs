use serde_json::Value;

use crate::query::Query;
use crate::strategy::{FilterStrategy, one_or_many_of};

/// Colour names accepted by [`ColorFilter`].
pub const COLORS: [&str; 19] = [
    "preto", "branco", "cinza", "azul", "vermelho", "verde", "amarelo", "rosa", "roxo", "laranja",
    "marrom", "bege", "dourado", "prateado", "navy", "vinho", "nude", "off-white", "creme",
];

/// Item `colors` array contains the colour, or any of several colours.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorFilter;

impl<Q: Query> FilterStrategy<Q> for ColorFilter {
    fn name(&self) -> &str {
        "color"
    }

    fn description(&self) -> &str {
        "Filters items by one colour or any of several colours"
    }

    fn is_valid_value(&self, value: &Value) -> bool {
        one_or_many_of(value, &COLORS)
    }

    fn possible_values(&self) -> Option<Vec<String>> {
        Some(COLORS.iter().map(|c| c.to_string()).collect())
    }

    fn apply(&self, query: Q, value: &Value) -> anyhow::Result<Q> {
        Ok(match value {
            Value::Array(colors) => query.where_any_json_contains("colors", colors.clone()),
            color => query.where_json_contains("colors", color.clone()),
        })
    }
}
