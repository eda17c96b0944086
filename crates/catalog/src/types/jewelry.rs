use serde_json::Value;

use closet_core::{Attributes, AttributesExt, Season};

use crate::descriptor::{
    Characteristics, FieldRule, ItemTypeDescriptor, RuleKind, condition_of, push_tag,
    scaled_durability, strings,
};

const BASE_MONTHS: f64 = 60.0;

/// Jewelry and costume jewelry.
#[derive(Debug, Clone, Default)]
pub struct JewelryItem {
    data: Attributes,
}

impl JewelryItem {
    pub fn new(data: Attributes) -> Self {
        Self { data }
    }

    fn metal(&self) -> String {
        self.data.lower_or("metal_type", "bijuteria")
    }
}

/// Jewelry keeps more of its lifetime when worn than other items.
fn condition_multiplier(condition: &str) -> f64 {
    match condition {
        "novo" => 1.0,
        "usado_excelente" => 0.9,
        "usado_bom" => 0.7,
        "usado_regular" => 0.5,
        "danificado" => 0.3,
        _ => 0.7,
    }
}

fn metal_multiplier(metal: &str) -> f64 {
    match metal {
        "ouro" => 2.0,
        "prata" => 1.5,
        "aco" => 1.3,
        "bronze" => 1.0,
        "bijuteria" => 0.5,
        _ => 1.0,
    }
}

impl ItemTypeDescriptor for JewelryItem {
    fn item_type(&self) -> &str {
        "jewelry"
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::new()
            .flag("has_material", true)
            .flag("has_value", true)
            .flag("delicate", true)
            .flag("requires_special_care", true)
            .flag("can_tarnish", true)
            .attributes(&[
                "metal_type",
                "gemstone",
                "karat",
                "hypoallergenic",
                "adjustable",
                "jewelry_type",
            ])
    }

    fn validation_rules(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::required("name", RuleKind::text(255)),
            FieldRule::optional(
                "metal_type",
                RuleKind::one_of(&["ouro", "prata", "aco", "bronze", "bijuteria"]),
            ),
            FieldRule::optional("karat", RuleKind::integer(Some(1), Some(24))),
            FieldRule::optional("hypoallergenic", RuleKind::Boolean),
            FieldRule::optional("adjustable", RuleKind::Boolean),
        ]
    }

    fn validate_data(&self, data: &Attributes) -> bool {
        data.is_present("name")
    }

    fn process_data(&self, data: &Attributes) -> Attributes {
        let mut processed = data.clone();
        let durability = self.calculate_durability(&condition_of(&processed));
        processed.insert("estimated_durability".into(), Value::from(durability));

        let mut tags = Vec::new();
        if let Some(metal) = processed.scalar("metal_type") {
            push_tag(&mut tags, format!("metal_{metal}"));
        }
        if processed.is_present("hypoallergenic") {
            push_tag(&mut tags, "hipoalergenico");
        }
        processed.insert("auto_tags".into(), Value::from(tags));
        processed
    }

    fn care_instructions(&self) -> Vec<String> {
        let lines: &[&str] = match self.metal().as_str() {
            "ouro" => &[
                "Limpar com pano macio",
                "Evitar produtos químicos",
                "Guardar separadamente",
                "Limpar com água morna e sabão neutro",
            ],
            "prata" => &[
                "Limpar com pano específico para prata",
                "Evitar exposição ao ar",
                "Usar produtos anti-oxidação",
                "Guardar em saquinhos",
            ],
            _ => &[
                "Evitar contato com água",
                "Limpar com pano seco",
                "Guardar em local seco",
                "Evitar perfumes e cremes",
            ],
        };
        strings(lines)
    }

    fn calculate_durability(&self, condition: &str) -> u32 {
        scaled_durability(
            BASE_MONTHS,
            &[condition_multiplier(condition), metal_multiplier(&self.metal())],
        )
    }

    fn recommended_seasons(&self) -> Vec<Season> {
        vec![Season::All]
    }
}
