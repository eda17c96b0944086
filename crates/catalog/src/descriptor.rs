//! Item-type descriptor contract.
//!
//! A descriptor bundles the behaviour of one item category: which attributes
//! it carries, how its input is validated and normalized, how long it lasts and
//! how it should be cared for. Descriptors are built from a raw attribute map
//! for a single call and dropped afterwards; they hold no shared state.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use closet_core::{Attributes, Season};

/// Behaviour bundle for one item category.
pub trait ItemTypeDescriptor: Send + Sync + fmt::Debug {
    /// Type tag (`"clothing"`, `"shoe"`, ...). Never empty for a valid descriptor.
    fn item_type(&self) -> &str;

    fn characteristics(&self) -> Characteristics;

    /// Field-level rules for input forms.
    fn validation_rules(&self) -> Vec<FieldRule>;

    /// Checks required fields and enumerations. Never errors.
    fn validate_data(&self, data: &Attributes) -> bool;

    /// Returns `data` with normalized fields, filled defaults and computed
    /// fields appended. Pure.
    fn process_data(&self, data: &Attributes) -> Attributes;

    fn care_instructions(&self) -> Vec<String>;

    /// Estimated lifetime in months for a condition label.
    fn calculate_durability(&self, condition: &str) -> u32;

    fn recommended_seasons(&self) -> Vec<Season>;
}

/// Capability flags plus the attribute names specific to a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Characteristics {
    #[serde(flatten)]
    pub flags: BTreeMap<String, bool>,
    pub specific_attributes: Vec<String>,
}

impl Characteristics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, name: &str, value: bool) -> Self {
        self.flags.insert(name.to_string(), value);
        self
    }

    pub fn attributes(mut self, names: &[&str]) -> Self {
        self.specific_attributes = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// False when the flag is unset.
    pub fn has(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

/// Kind of value a field accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    Text { max: Option<usize> },
    Number { min: Option<f64>, max: Option<f64> },
    Integer { min: Option<i64>, max: Option<i64> },
    Boolean,
    OneOf { values: Vec<String> },
}

impl RuleKind {
    pub fn text(max: usize) -> Self {
        RuleKind::Text { max: Some(max) }
    }

    pub fn one_of(values: &[&str]) -> Self {
        RuleKind::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn number(min: Option<f64>, max: Option<f64>) -> Self {
        RuleKind::Number { min, max }
    }

    pub fn integer(min: Option<i64>, max: Option<i64>) -> Self {
        RuleKind::Integer { min, max }
    }
}

/// A single field rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRule {
    pub field: String,
    pub required: bool,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl FieldRule {
    pub fn required(field: &str, kind: RuleKind) -> Self {
        Self {
            field: field.to_string(),
            required: true,
            kind,
        }
    }

    pub fn optional(field: &str, kind: RuleKind) -> Self {
        Self {
            field: field.to_string(),
            required: false,
            kind,
        }
    }

    /// Whether `value` satisfies the kind of this rule. Absent and null values
    /// only pass for optional fields.
    pub fn accepts(&self, value: Option<&Value>) -> bool {
        let value = match value {
            None | Some(Value::Null) => return !self.required,
            Some(v) => v,
        };
        match &self.kind {
            RuleKind::Text { max } => match value.as_str() {
                Some(s) => max.is_none_or(|m| s.chars().count() <= m),
                None => false,
            },
            RuleKind::Number { min, max } => match closet_core::attributes::as_number(value) {
                Some(n) => min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m),
                None => false,
            },
            RuleKind::Integer { min, max } => match value.as_i64() {
                Some(n) => min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m),
                None => false,
            },
            RuleKind::Boolean => value.is_boolean(),
            RuleKind::OneOf { values } => value
                .as_str()
                .is_some_and(|s| values.iter().any(|v| v == s)),
        }
    }
}

fn fmt_bound<T: fmt::Display>(f: &mut fmt::Formatter<'_>, name: &str, bound: &Option<T>) -> fmt::Result {
    match bound {
        Some(b) => write!(f, "|{name}:{b}"),
        None => Ok(()),
    }
}

/// Renders the conventional pipe form, e.g. `required|string|max:255`.
impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.required { "required" } else { "nullable" })?;
        match &self.kind {
            RuleKind::Text { max } => {
                f.write_str("|string")?;
                fmt_bound(f, "max", max)
            }
            RuleKind::Number { min, max } => {
                f.write_str("|numeric")?;
                fmt_bound(f, "min", min)?;
                fmt_bound(f, "max", max)
            }
            RuleKind::Integer { min, max } => {
                f.write_str("|integer")?;
                fmt_bound(f, "min", min)?;
                fmt_bound(f, "max", max)
            }
            RuleKind::Boolean => f.write_str("|boolean"),
            RuleKind::OneOf { values } => write!(f, "|string|in:{}", values.join(",")),
        }
    }
}

/// Introspection view of a descriptor built from empty attributes.
#[derive(Debug, Clone, Serialize)]
pub struct TypeInfo {
    #[serde(rename = "type")]
    pub item_type: String,
    pub characteristics: Characteristics,
    pub validation_rules: Vec<FieldRule>,
    pub care_instructions: Vec<String>,
    pub recommended_seasons: Vec<Season>,
}

impl TypeInfo {
    pub fn of(descriptor: &dyn ItemTypeDescriptor) -> Self {
        Self {
            item_type: descriptor.item_type().to_string(),
            characteristics: descriptor.characteristics(),
            validation_rules: descriptor.validation_rules(),
            care_instructions: descriptor.care_instructions(),
            recommended_seasons: descriptor.recommended_seasons(),
        }
    }
}

/// `round(base × Π factors)` in whole months.
pub(crate) fn scaled_durability(base: f64, factors: &[f64]) -> u32 {
    let months = factors.iter().fold(base, |acc, f| acc * f).round();
    if months <= 0.0 { 0 } else { months as u32 }
}

/// Owned copies of static strings.
pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Appends `tag` unless already present.
pub(crate) fn push_tag(tags: &mut Vec<String>, tag: impl Into<String>) {
    let tag = tag.into();
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

/// Season list rendered as a JSON array of labels.
pub(crate) fn seasons_value(seasons: &[Season]) -> Value {
    Value::Array(
        seasons
            .iter()
            .map(|s| Value::String(s.as_str().to_string()))
            .collect(),
    )
}

/// Condition label stored on a record, `usado_bom` when absent.
pub(crate) fn condition_of(data: &Attributes) -> String {
    use closet_core::AttributesExt;
    data.scalar("condition")
        .unwrap_or_else(|| closet_core::ItemCondition::DEFAULT_LABEL.to_string())
}
