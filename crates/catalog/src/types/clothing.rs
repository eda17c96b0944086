use serde_json::Value;

use closet_core::{Attributes, AttributesExt, ItemCondition, Season};

use crate::descriptor::{
    Characteristics, FieldRule, ItemTypeDescriptor, RuleKind, condition_of, push_tag,
    scaled_durability, seasons_value, strings,
};

const VALID_SIZES: &[&str] = &[
    "PP", "P", "M", "G", "GG", "XG", "XXG", "34", "36", "38", "40", "42", "44", "46", "48", "50",
    "52",
];

const VALID_FABRICS: &[&str] = &[
    "algodao", "poliester", "viscose", "linho", "seda", "la", "jeans", "elastano", "nylon",
    "modal", "cashmere", "couro", "sintetico",
];

const BASE_MONTHS: f64 = 24.0;

/// Garments: tops, bottoms, dresses, outerwear, underwear.
#[derive(Debug, Clone, Default)]
pub struct ClothingItem {
    data: Attributes,
}

impl ClothingItem {
    pub fn new(data: Attributes) -> Self {
        Self { data }
    }

    fn fabric(&self) -> String {
        self.data.lower_or("fabric_type", "algodao")
    }
}

fn fabric_multiplier(fabric: &str) -> f64 {
    match fabric {
        "jeans" | "couro" => 1.5,
        "la" | "cashmere" => 1.3,
        "algodao" | "linho" => 1.0,
        "poliester" | "nylon" => 0.8,
        "seda" | "viscose" => 0.7,
        _ => 1.0,
    }
}

fn default_washing_instructions(data: &Attributes) -> &'static str {
    match data.lower_or("fabric_type", "algodao").as_str() {
        "seda" | "la" | "cashmere" => "Lavagem a seco recomendada",
        "jeans" => "Lavar do avesso em água fria",
        "poliester" => "Ciclo delicado, água fria",
        _ => "Lavar em água fria, secar à sombra",
    }
}

/// Seasons inferred from the garment name and fabric of a record being processed.
fn infer_seasons(data: &Attributes) -> Vec<Season> {
    let name = data.lower_or("name", "");
    let fabric = data.lower_or("fabric_type", "");
    let named = |words: &[&str]| words.iter().any(|w| name.contains(w));

    if named(&["casaco", "jaqueta", "sueter", "moletom"]) || fabric == "la" || fabric == "cashmere"
    {
        return vec![Season::Autumn, Season::Winter];
    }
    if named(&["shorts", "regata", "biquini", "maio"]) {
        return vec![Season::Spring, Season::Summer];
    }
    vec![Season::All]
}

impl ItemTypeDescriptor for ClothingItem {
    fn item_type(&self) -> &str {
        "clothing"
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::new()
            .flag("has_size", true)
            .flag("has_fabric", true)
            .flag("has_fit", true)
            .flag("requires_washing", true)
            .flag("can_be_ironed", true)
            .flag("seasonal_usage", true)
            .flag("layerable", true)
            .attributes(&[
                "fabric_type",
                "fit_type",
                "sleeve_length",
                "neckline",
                "closure_type",
                "pattern",
                "washing_instructions",
            ])
    }

    fn validation_rules(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::required("name", RuleKind::text(255)),
            FieldRule::required("size", RuleKind::one_of(VALID_SIZES)),
            FieldRule::optional("fabric_type", RuleKind::one_of(VALID_FABRICS)),
            FieldRule::optional(
                "fit_type",
                RuleKind::one_of(&["slim", "regular", "loose", "oversized", "cropped"]),
            ),
            FieldRule::optional(
                "sleeve_length",
                RuleKind::one_of(&["sem_manga", "manga_curta", "manga_3_4", "manga_longa"]),
            ),
            FieldRule::optional(
                "neckline",
                RuleKind::one_of(&[
                    "redondo",
                    "v",
                    "canoa",
                    "gola_alta",
                    "ombro_a_ombro",
                    "decote_profundo",
                ]),
            ),
            FieldRule::optional(
                "closure_type",
                RuleKind::one_of(&["botao", "ziper", "velcro", "amarracao", "elastico", "nenhum"]),
            ),
            FieldRule::optional(
                "pattern",
                RuleKind::one_of(&[
                    "liso",
                    "listrado",
                    "xadrez",
                    "floral",
                    "geometrico",
                    "animal_print",
                    "abstrato",
                ]),
            ),
            FieldRule::optional("washing_instructions", RuleKind::text(500)),
        ]
    }

    fn validate_data(&self, data: &Attributes) -> bool {
        if !data.is_present("name") || !data.is_present("size") {
            return false;
        }

        if data.has("size") {
            match data.scalar("size") {
                Some(size) if VALID_SIZES.contains(&size.to_uppercase().as_str()) => {}
                _ => return false,
            }
        }

        if data.has("fabric_type") {
            match data.scalar("fabric_type") {
                Some(fabric) if VALID_FABRICS.contains(&fabric.to_lowercase().as_str()) => {}
                _ => return false,
            }
        }

        true
    }

    fn process_data(&self, data: &Attributes) -> Attributes {
        let mut processed = data.clone();

        if let Some(size) = processed.scalar("size") {
            processed.insert("size".into(), Value::String(size.to_uppercase()));
        }

        if !processed.has("washing_instructions") {
            let text = default_washing_instructions(&processed);
            processed.insert("washing_instructions".into(), Value::String(text.into()));
        }

        let durability = self.calculate_durability(&condition_of(&processed));
        processed.insert("estimated_durability".into(), Value::from(durability));

        if !processed.has("recommended_seasons") {
            let seasons = infer_seasons(&processed);
            processed.insert("recommended_seasons".into(), seasons_value(&seasons));
        }

        let tags = self.auto_tags(&processed);
        processed.insert("auto_tags".into(), Value::from(tags));

        processed
    }

    fn care_instructions(&self) -> Vec<String> {
        let lines: &[&str] = match self.fabric().as_str() {
            "poliester" => &[
                "Lavar em água fria (30°C)",
                "Ciclo delicado na máquina",
                "Secar rapidamente",
                "Ferro baixo ou não passar",
                "Evitar amaciante",
            ],
            "seda" => &[
                "Lavar à mão ou lavagem a seco",
                "Água fria apenas",
                "Não torcer ou esfregar",
                "Secar na horizontal",
                "Ferro baixo com pano protetor",
            ],
            "la" => &[
                "Lavagem a seco recomendada",
                "Se lavar à mão, água fria",
                "Não torcer",
                "Secar na horizontal",
                "Guardar com antitraça",
            ],
            "jeans" => &[
                "Lavar do avesso",
                "Água fria para preservar cor",
                "Secar à sombra",
                "Ferro morno",
                "Evitar alvejante",
            ],
            _ => &[
                "Lavar em água fria ou morna (30°C)",
                "Pode usar máquina de lavar",
                "Secar à sombra",
                "Passar com ferro morno",
                "Pode usar amaciante",
            ],
        };
        strings(lines)
    }

    fn calculate_durability(&self, condition: &str) -> u32 {
        scaled_durability(
            BASE_MONTHS,
            &[
                ItemCondition::multiplier_for(condition),
                fabric_multiplier(&self.fabric()),
            ],
        )
    }

    fn recommended_seasons(&self) -> Vec<Season> {
        let name = self.data.lower_or("name", "");
        let named = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if named(&["casaco", "jaqueta", "sueter"]) {
            vec![Season::Autumn, Season::Winter]
        } else if named(&["shorts", "regata", "biquini"]) {
            vec![Season::Spring, Season::Summer]
        } else if named(&["vestido", "saia"]) {
            vec![Season::Spring, Season::Summer, Season::Autumn]
        } else {
            vec![Season::All]
        }
    }
}

impl ClothingItem {
    fn auto_tags(&self, data: &Attributes) -> Vec<String> {
        let mut tags = Vec::new();
        if let Some(fabric) = data.scalar("fabric_type") {
            push_tag(&mut tags, format!("tecido_{fabric}"));
        }
        if let Some(fit) = data.scalar("fit_type") {
            push_tag(&mut tags, format!("ajuste_{fit}"));
        }
        for season in self.recommended_seasons() {
            push_tag(&mut tags, format!("estacao_{season}"));
        }
        if let Some(condition) = data.scalar("condition") {
            push_tag(&mut tags, format!("condicao_{condition}"));
        }
        tags
    }
}
