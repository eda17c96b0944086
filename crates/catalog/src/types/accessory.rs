use serde_json::Value;

use closet_core::{Attributes, AttributesExt, ItemCondition, Season};

use crate::descriptor::{
    Characteristics, FieldRule, ItemTypeDescriptor, RuleKind, condition_of, push_tag,
    scaled_durability, strings,
};

const VALID_MATERIALS: &[&str] = &[
    "couro", "metal", "plastico", "tecido", "madeira", "vidro", "ceramica", "borracha",
    "silicone", "ouro", "prata", "aco",
];

const VALID_STYLES: &[&str] = &[
    "casual",
    "formal",
    "esportivo",
    "vintage",
    "moderno",
    "boho",
    "minimalista",
];

const NEUTRAL_COLORS: &[&str] = &["preto", "branco", "cinza", "bege", "marrom"];

const BASE_MONTHS: f64 = 36.0;

/// Belts, hats, glasses, scarves and other accessories. Also the fallback
/// descriptor for categories with no mapping.
#[derive(Debug, Clone, Default)]
pub struct AccessoryItem {
    data: Attributes,
}

impl AccessoryItem {
    pub fn new(data: Attributes) -> Self {
        Self { data }
    }

    fn material(&self) -> String {
        self.data.lower_or("material_type", "tecido")
    }
}

fn material_multiplier(material: &str) -> f64 {
    match material {
        "ouro" | "prata" | "aco" => 2.0,
        "couro" | "metal" => 1.5,
        "madeira" | "ceramica" => 1.2,
        "tecido" | "plastico" => 1.0,
        "borracha" | "silicone" => 0.8,
        _ => 1.0,
    }
}

fn care_level(data: &Attributes) -> &'static str {
    match data.lower_or("material_type", "tecido").as_str() {
        "ouro" | "prata" | "couro" => "alto",
        "metal" | "madeira" | "ceramica" => "medio",
        "tecido" | "plastico" | "borracha" | "silicone" => "baixo",
        _ => "medio",
    }
}

/// How many outfits an accessory fits, capped at 10.
pub fn versatility_score(data: &Attributes) -> i64 {
    let mut score: i64 = 5;

    for color in data.string_list("colors") {
        if NEUTRAL_COLORS.contains(&color.to_lowercase().as_str()) {
            score += 2;
        }
    }

    let style = data.lower_or("style_category", "");
    if matches!(style.as_str(), "casual" | "minimalista" | "moderno") {
        score += 2;
    }

    if data.is_present("adjustable") {
        score += 1;
    }

    score.min(10)
}

fn auto_tags(data: &Attributes) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(material) = data.scalar("material_type") {
        push_tag(&mut tags, format!("material_{material}"));
    }
    if let Some(style) = data.scalar("style_category") {
        push_tag(&mut tags, format!("estilo_{style}"));
    }
    if data.is_present("waterproof") {
        push_tag(&mut tags, "a_prova_dagua");
    }
    if data.is_present("uv_protection") {
        push_tag(&mut tags, "protecao_uv");
    }
    if data.is_present("adjustable") {
        push_tag(&mut tags, "ajustavel");
    }

    let versatility = versatility_score(data);
    if versatility >= 8 {
        push_tag(&mut tags, "muito_versatil");
    } else if versatility >= 6 {
        push_tag(&mut tags, "versatil");
    }
    tags
}

fn recommended_occasions(data: &Attributes) -> Vec<String> {
    let base: &[&str] = match data.lower_or("style_category", "casual").as_str() {
        "formal" => &["trabalho", "festa", "formal"],
        "esportivo" => &["esporte", "casual"],
        "casual" => &["casual", "trabalho"],
        _ => &["todas"],
    };

    let mut occasions = strings(base);
    if matches!(data.lower_or("material_type", "tecido").as_str(), "ouro" | "prata") {
        for extra in ["festa", "formal"] {
            push_tag(&mut occasions, extra);
        }
    }
    occasions
}

impl ItemTypeDescriptor for AccessoryItem {
    fn item_type(&self) -> &str {
        "accessory"
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::new()
            .flag("has_size", true)
            .flag("has_material", true)
            .flag("has_color", true)
            .flag("requires_special_care", true)
            .flag("can_be_combined", true)
            .flag("seasonal_usage", false)
            .flag("versatile", true)
            .attributes(&[
                "material_type",
                "adjustable",
                "waterproof",
                "uv_protection",
                "care_level",
                "style_category",
            ])
    }

    fn validation_rules(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::required("name", RuleKind::text(255)),
            FieldRule::optional("material_type", RuleKind::one_of(VALID_MATERIALS)),
            FieldRule::optional("adjustable", RuleKind::Boolean),
            FieldRule::optional("waterproof", RuleKind::Boolean),
            FieldRule::optional("uv_protection", RuleKind::Boolean),
            FieldRule::optional("style_category", RuleKind::one_of(VALID_STYLES)),
            FieldRule::optional("care_level", RuleKind::one_of(&["baixo", "medio", "alto"])),
            FieldRule::optional("size", RuleKind::text(50)),
        ]
    }

    fn validate_data(&self, data: &Attributes) -> bool {
        if !data.is_present("name") {
            return false;
        }

        if data.has("material_type") {
            let material = data.lower_or("material_type", "");
            if !VALID_MATERIALS.contains(&material.as_str()) {
                return false;
            }
        }

        if data.has("style_category") {
            let style = data.lower_or("style_category", "");
            if !VALID_STYLES.contains(&style.as_str()) {
                return false;
            }
        }

        true
    }

    fn process_data(&self, data: &Attributes) -> Attributes {
        let mut processed = data.clone();

        if !processed.has("care_level") {
            let level = care_level(&processed);
            processed.insert("care_level".into(), Value::String(level.into()));
        }

        let durability = self.calculate_durability(&condition_of(&processed));
        processed.insert("estimated_durability".into(), Value::from(durability));

        let versatility = versatility_score(&processed);
        processed.insert("versatility_score".into(), Value::from(versatility));

        let tags = auto_tags(&processed);
        processed.insert("auto_tags".into(), Value::from(tags));

        let occasions = recommended_occasions(&processed);
        processed.insert("recommended_occasions".into(), Value::from(occasions));

        processed
    }

    fn care_instructions(&self) -> Vec<String> {
        let lines: &[&str] = match self.material().as_str() {
            "couro" => &[
                "Limpar com pano úmido",
                "Usar produtos específicos para couro",
                "Evitar exposição direta ao sol",
                "Guardar em local arejado",
                "Hidratar periodicamente",
            ],
            "metal" => &[
                "Limpar com pano seco",
                "Evitar contato com água",
                "Usar produtos anti-oxidação",
                "Guardar em local seco",
                "Polir ocasionalmente",
            ],
            "ouro" => &[
                "Limpar com pano macio",
                "Evitar produtos químicos",
                "Guardar separadamente",
                "Limpar com água morna e sabão neutro",
                "Secar completamente",
            ],
            "prata" => &[
                "Limpar com pano específico",
                "Evitar exposição ao ar",
                "Usar produtos anti-oxidação",
                "Guardar em saquinhos",
                "Polir regularmente",
            ],
            "plastico" => &[
                "Limpar com água e sabão",
                "Evitar produtos abrasivos",
                "Secar completamente",
                "Guardar em local fresco",
                "Evitar exposição ao calor",
            ],
            _ => &[
                "Lavar conforme instruções",
                "Secar à sombra",
                "Passar se necessário",
                "Guardar limpo e seco",
                "Evitar dobras excessivas",
            ],
        };
        strings(lines)
    }

    fn calculate_durability(&self, condition: &str) -> u32 {
        scaled_durability(
            BASE_MONTHS,
            &[
                ItemCondition::multiplier_for(condition),
                material_multiplier(&self.material()),
            ],
        )
    }

    fn recommended_seasons(&self) -> Vec<Season> {
        let name = self.data.lower_or("name", "");
        let named = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if named(&["cachecol", "luva", "gorro"]) {
            vec![Season::Autumn, Season::Winter]
        } else if named(&["oculos", "chapeu", "bone"]) {
            vec![Season::Spring, Season::Summer]
        } else {
            vec![Season::All]
        }
    }
}
