use serde_json::Value;

use closet_core::{Attributes, AttributesExt, ItemCondition, Season};

use crate::descriptor::{
    Characteristics, FieldRule, ItemTypeDescriptor, RuleKind, condition_of, push_tag,
    scaled_durability, strings,
};

const BASE_MONTHS: f64 = 30.0;

/// Bags, backpacks, wallets and luggage. Behaviour does not depend on the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct BagItem;

fn auto_tags(data: &Attributes) -> Vec<String> {
    let mut tags = Vec::new();
    if data.is_present("waterproof") {
        push_tag(&mut tags, "a_prova_dagua");
    }
    if data.has("capacity_liters") {
        let capacity = data.number("capacity_liters").unwrap_or(0.0);
        let band = if capacity <= 5.0 {
            "pequena"
        } else if capacity <= 15.0 {
            "media"
        } else {
            "grande"
        };
        push_tag(&mut tags, band);
    }
    tags
}

impl ItemTypeDescriptor for BagItem {
    fn item_type(&self) -> &str {
        "bag"
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::new()
            .flag("has_size", true)
            .flag("has_capacity", true)
            .flag("has_compartments", true)
            .flag("has_closure", true)
            .flag("portable", true)
            .flag("functional", true)
            .attributes(&[
                "capacity_liters",
                "compartments_count",
                "closure_type",
                "strap_type",
                "waterproof",
                "security_features",
            ])
    }

    fn validation_rules(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::required("name", RuleKind::text(255)),
            FieldRule::optional("capacity_liters", RuleKind::number(Some(0.0), None)),
            FieldRule::optional("compartments_count", RuleKind::integer(Some(1), None)),
            FieldRule::optional(
                "closure_type",
                RuleKind::one_of(&["ziper", "botao", "ima", "velcro", "fivela"]),
            ),
            FieldRule::optional(
                "strap_type",
                RuleKind::one_of(&["alca", "tiracolo", "mochila", "mao", "nenhuma"]),
            ),
            FieldRule::optional("waterproof", RuleKind::Boolean),
        ]
    }

    fn validate_data(&self, data: &Attributes) -> bool {
        if !data.is_present("name") {
            return false;
        }
        !data.number("capacity_liters").is_some_and(|c| c < 0.0)
    }

    fn process_data(&self, data: &Attributes) -> Attributes {
        let mut processed = data.clone();
        let durability = self.calculate_durability(&condition_of(&processed));
        processed.insert("estimated_durability".into(), Value::from(durability));
        let tags = auto_tags(&processed);
        processed.insert("auto_tags".into(), Value::from(tags));
        processed
    }

    fn care_instructions(&self) -> Vec<String> {
        strings(&[
            "Limpar regularmente por dentro e por fora",
            "Usar produtos adequados ao material",
            "Secar completamente antes de guardar",
            "Manter formato com enchimento quando não usar",
            "Evitar sobrecarga de peso",
        ])
    }

    fn calculate_durability(&self, condition: &str) -> u32 {
        scaled_durability(BASE_MONTHS, &[ItemCondition::multiplier_for(condition)])
    }

    fn recommended_seasons(&self) -> Vec<Season> {
        vec![Season::All]
    }
}
