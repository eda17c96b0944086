//! Value objects shared by the engine crates.
//!
//! Value objects have no identity; two with the same values are the same.
//! The wire labels (`"novo"`, `"verao"`, ...) are the vocabulary stored on item
//! records, so parsing and rendering go through `as_str`/`parse` rather than
//! variant names.

use serde::{Deserialize, Serialize};

/// Conservation state of an item, best first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemCondition {
    #[serde(rename = "novo")]
    New,
    #[serde(rename = "usado_excelente")]
    Excellent,
    #[serde(rename = "usado_bom")]
    Good,
    #[serde(rename = "usado_regular")]
    Fair,
    #[serde(rename = "danificado")]
    Damaged,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 5] = [
        ItemCondition::New,
        ItemCondition::Excellent,
        ItemCondition::Good,
        ItemCondition::Fair,
        ItemCondition::Damaged,
    ];

    /// Condition assumed when a record carries none.
    pub const DEFAULT_LABEL: &'static str = "usado_bom";

    pub fn as_str(self) -> &'static str {
        match self {
            ItemCondition::New => "novo",
            ItemCondition::Excellent => "usado_excelente",
            ItemCondition::Good => "usado_bom",
            ItemCondition::Fair => "usado_regular",
            ItemCondition::Damaged => "danificado",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Share of the base lifetime left in this condition.
    pub fn standard_multiplier(self) -> f64 {
        match self {
            ItemCondition::New => 1.0,
            ItemCondition::Excellent => 0.8,
            ItemCondition::Good => 0.6,
            ItemCondition::Fair => 0.4,
            ItemCondition::Damaged => 0.2,
        }
    }

    /// [`standard_multiplier`](Self::standard_multiplier) for a raw label;
    /// unknown labels count as `usado_bom`.
    pub fn multiplier_for(label: &str) -> f64 {
        Self::parse(label)
            .unwrap_or(ItemCondition::Good)
            .standard_multiplier()
    }
}

impl core::fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season of the year, plus `All` for items worn year-round.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "primavera")]
    Spring,
    #[serde(rename = "verao")]
    Summer,
    #[serde(rename = "outono")]
    Autumn,
    #[serde(rename = "inverno")]
    Winter,
    #[serde(rename = "todas")]
    All,
}

impl Season {
    pub const ALL_LABELS: [&'static str; 5] = ["primavera", "verao", "outono", "inverno", "todas"];

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Spring => "primavera",
            Season::Summer => "verao",
            Season::Autumn => "outono",
            Season::Winter => "inverno",
            Season::All => "todas",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "primavera" => Some(Season::Spring),
            "verao" => Some(Season::Summer),
            "outono" => Some(Season::Autumn),
            "inverno" => Some(Season::Winter),
            "todas" => Some(Season::All),
            _ => None,
        }
    }

    /// Season for a calendar month (1-12), southern hemisphere.
    pub fn for_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Summer,
            3..=5 => Season::Autumn,
            6..=8 => Season::Winter,
            _ => Season::Spring,
        }
    }
}

impl core::fmt::Display for Season {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_labels_round_trip() {
        for c in ItemCondition::ALL {
            assert_eq!(ItemCondition::parse(c.as_str()), Some(c));
        }
        assert_eq!(ItemCondition::parse("seminovo"), None);
    }

    #[test]
    fn unknown_condition_uses_default_multiplier() {
        assert_eq!(ItemCondition::multiplier_for("novo"), 1.0);
        assert_eq!(ItemCondition::multiplier_for("whatever"), 0.6);
    }

    #[test]
    fn conditions_order_best_first() {
        assert!(ItemCondition::New < ItemCondition::Damaged);
        assert!(ItemCondition::Good < ItemCondition::Fair);
    }

    #[test]
    fn seasons_follow_southern_hemisphere() {
        assert_eq!(Season::for_month(1), Season::Summer);
        assert_eq!(Season::for_month(4), Season::Autumn);
        assert_eq!(Season::for_month(7), Season::Winter);
        assert_eq!(Season::for_month(10), Season::Spring);
        assert_eq!(Season::for_month(12), Season::Summer);
    }

    #[test]
    fn season_serializes_as_label() {
        let json = serde_json::to_string(&vec![Season::Autumn, Season::Winter]).unwrap();
        assert_eq!(json, r#"["outono","inverno"]"#);
    }
}
