use serde_json::Value;

use closet_core::{Attributes, AttributesExt, ItemCondition, Season};

use crate::descriptor::{
    Characteristics, FieldRule, ItemTypeDescriptor, RuleKind, condition_of, push_tag,
    scaled_durability, strings,
};

const SHOE_CATEGORIES: &[&str] = &[
    "casual",
    "formal",
    "esportivo",
    "social",
    "festa",
    "praia",
    "casa",
    "trabalho",
    "caminhada",
    "corrida",
];

const BASE_MONTHS: f64 = 18.0;

/// Footwear. Sizes are numeric (30 to 50).
#[derive(Debug, Clone, Default)]
pub struct ShoeItem {
    data: Attributes,
}

impl ShoeItem {
    pub fn new(data: Attributes) -> Self {
        Self { data }
    }

    fn material(&self) -> String {
        self.data.lower_or("material_type", "couro")
    }

    fn category(&self) -> String {
        self.data.lower_or("shoe_category", "casual")
    }
}

fn material_multiplier(material: &str) -> f64 {
    match material {
        "couro" => 1.5,
        "sintetico" => 1.0,
        "tecido" => 0.7,
        "borracha" => 1.2,
        _ => 1.0,
    }
}

fn category_multiplier(category: &str) -> f64 {
    match category {
        "formal" | "social" => 1.3,
        "casual" => 1.0,
        "esportivo" | "corrida" => 0.8,
        "casa" => 1.5,
        _ => 1.0,
    }
}

/// Category guessed from the name. Matches unaccented words only.
fn infer_category(data: &Attributes) -> &'static str {
    let name = data.lower_or("name", "");
    let named = |words: &[&str]| words.iter().any(|w| name.contains(w));

    if named(&["tenis", "corrida"]) {
        "esportivo"
    } else if named(&["social", "oxford"]) {
        "formal"
    } else if named(&["sandalia", "chinelo"]) {
        "praia"
    } else if named(&["salto", "scarpin"]) {
        "festa"
    } else {
        "casual"
    }
}

fn heel_height(data: &Attributes) -> f64 {
    data.number("heel_height").unwrap_or(0.0)
}

/// Comfort on a 1..=10 scale from heel, sole and support features.
pub fn comfort_level(data: &Attributes) -> i64 {
    let mut comfort: i64 = 5;

    let heel = heel_height(data);
    if heel == 0.0 {
        comfort += 2;
    } else if heel <= 3.0 {
        comfort += 1;
    } else if heel > 8.0 {
        comfort -= 2;
    }

    match data.lower_or("sole_type", "").as_str() {
        "eva" | "gel" | "ar" => comfort += 2,
        "borracha" => comfort += 1,
        _ => {}
    }

    if data.is_present("arch_support") {
        comfort += 1;
    }
    if data.is_present("breathable") {
        comfort += 1;
    }

    comfort.clamp(1, 10)
}

fn recommended_occasions(data: &Attributes) -> Vec<String> {
    let occasions: &[&str] = match data.lower_or("shoe_category", "casual").as_str() {
        "formal" | "social" => &["trabalho", "formal", "festa"],
        "esportivo" => &["esporte", "casual", "caminhada"],
        "festa" => &["festa", "formal"],
        "praia" => &["casual", "praia", "casa"],
        "casa" => &["casa", "casual"],
        "trabalho" => &["trabalho", "casual"],
        "casual" => &["casual", "trabalho"],
        _ => &["todas"],
    };
    strings(occasions)
}

fn auto_tags(data: &Attributes) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(category) = data.scalar("shoe_category") {
        push_tag(&mut tags, format!("categoria_{category}"));
    }

    let heel = heel_height(data);
    let band = if heel == 0.0 {
        "sem_salto"
    } else if heel <= 3.0 {
        "salto_baixo"
    } else if heel <= 7.0 {
        "salto_medio"
    } else {
        "salto_alto"
    };
    push_tag(&mut tags, band);

    let comfort = comfort_level(data);
    if comfort >= 8 {
        push_tag(&mut tags, "muito_confortavel");
    } else if comfort >= 6 {
        push_tag(&mut tags, "confortavel");
    }

    if data.is_present("waterproof") {
        push_tag(&mut tags, "a_prova_dagua");
    }
    if data.is_present("breathable") {
        push_tag(&mut tags, "respiravel");
    }
    if data.is_present("arch_support") {
        push_tag(&mut tags, "suporte_arco");
    }

    tags
}

/// Whole-number size label, e.g. `"41.6"` becomes `"42"`.
fn size_label(value: &Value) -> Option<String> {
    closet_core::attributes::as_number(value).map(|n| format!("{:.0}", n.round()))
}

impl ItemTypeDescriptor for ShoeItem {
    fn item_type(&self) -> &str {
        "shoe"
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::new()
            .flag("has_size", true)
            .flag("has_material", true)
            .flag("has_heel_height", true)
            .flag("requires_special_care", true)
            .flag("size_specific", true)
            .flag("comfort_rating", true)
            .flag("weather_dependent", true)
            .attributes(&[
                "heel_height",
                "sole_type",
                "closure_type",
                "waterproof",
                "breathable",
                "comfort_level",
                "arch_support",
                "shoe_category",
            ])
    }

    fn validation_rules(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::required("name", RuleKind::text(255)),
            FieldRule::required("size", RuleKind::number(Some(30.0), Some(50.0))),
            FieldRule::optional("heel_height", RuleKind::number(Some(0.0), Some(20.0))),
            FieldRule::optional(
                "sole_type",
                RuleKind::one_of(&["borracha", "couro", "sintetico", "eva", "gel", "ar"]),
            ),
            FieldRule::optional(
                "closure_type",
                RuleKind::one_of(&["cadarco", "velcro", "fivela", "slip_on", "ziper", "elastico"]),
            ),
            FieldRule::optional("waterproof", RuleKind::Boolean),
            FieldRule::optional("breathable", RuleKind::Boolean),
            FieldRule::optional("arch_support", RuleKind::Boolean),
            FieldRule::optional("shoe_category", RuleKind::one_of(SHOE_CATEGORIES)),
            FieldRule::optional("comfort_level", RuleKind::integer(Some(1), Some(10))),
        ]
    }

    fn validate_data(&self, data: &Attributes) -> bool {
        if !data.is_present("name") || !data.is_present("size") {
            return false;
        }

        if data.has("size") {
            let size = data.number("size").unwrap_or(0.0);
            if !(30.0..=50.0).contains(&size) {
                return false;
            }
        }

        if data.has("heel_height") {
            let heel = data.number("heel_height").unwrap_or(0.0);
            if !(0.0..=20.0).contains(&heel) {
                return false;
            }
        }

        if data.has("shoe_category") {
            let category = data.lower_or("shoe_category", "");
            if !SHOE_CATEGORIES.contains(&category.as_str()) {
                return false;
            }
        }

        true
    }

    fn process_data(&self, data: &Attributes) -> Attributes {
        let mut processed = data.clone();

        if let Some(label) = processed.get("size").and_then(size_label) {
            processed.insert("size".into(), Value::String(label));
        }

        if !processed.has("shoe_category") {
            let category = infer_category(&processed);
            processed.insert("shoe_category".into(), Value::String(category.into()));
        }

        let comfort = comfort_level(&processed);
        processed.insert("comfort_level".into(), Value::from(comfort));

        let durability = self.calculate_durability(&condition_of(&processed));
        processed.insert("estimated_durability".into(), Value::from(durability));

        let occasions = recommended_occasions(&processed);
        processed.insert("recommended_occasions".into(), Value::from(occasions));

        let tags = auto_tags(&processed);
        processed.insert("auto_tags".into(), Value::from(tags));

        processed.insert(
            "care_instructions".into(),
            Value::from(self.care_instructions()),
        );

        processed
    }

    fn care_instructions(&self) -> Vec<String> {
        let base: &[&str] = match self.material().as_str() {
            "sintetico" => &[
                "Limpar com pano úmido e sabão neutro",
                "Secar à sombra",
                "Evitar produtos químicos agressivos",
                "Guardar em local arejado",
                "Verificar desgaste regularmente",
            ],
            "tecido" => &[
                "Pode ser lavado na máquina (ciclo delicado)",
                "Usar água fria",
                "Secar à sombra",
                "Não usar alvejante",
                "Remover cadarços antes da lavagem",
            ],
            "borracha" => &[
                "Lavar com água e sabão",
                "Secar completamente",
                "Evitar exposição ao calor",
                "Guardar em local fresco",
                "Verificar rachaduras",
            ],
            _ => &[
                "Limpar com pano úmido após o uso",
                "Usar produtos específicos para couro",
                "Deixar secar naturalmente",
                "Usar forma para manter formato",
                "Hidratar o couro periodicamente",
                "Evitar exposição direta ao sol",
            ],
        };

        let mut lines = strings(base);
        if self.category() == "esportivo" {
            lines.extend(strings(&[
                "Trocar palmilhas regularmente",
                "Deixar arejar entre os usos",
                "Usar meias adequadas",
            ]));
        }
        lines
    }

    fn calculate_durability(&self, condition: &str) -> u32 {
        scaled_durability(
            BASE_MONTHS,
            &[
                ItemCondition::multiplier_for(condition),
                material_multiplier(&self.material()),
                category_multiplier(&self.category()),
            ],
        )
    }

    fn recommended_seasons(&self) -> Vec<Season> {
        let name = self.data.lower_or("name", "");
        let category = self.category();

        if name.contains("bota") || category == "trabalho" {
            vec![Season::Autumn, Season::Winter]
        } else if name.contains("sandalia") || name.contains("chinelo") || category == "praia" {
            vec![Season::Spring, Season::Summer]
        } else {
            vec![Season::All]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn accented_name_is_not_inferred_as_sport() {
        let raw = attrs(json!({"name": "Tênis X", "size": "42"}));
        let item = ShoeItem::new(raw.clone());
        assert!(item.validate_data(&raw));

        let out = item.process_data(&raw);
        assert_eq!(out["size"], json!("42"));
        assert_eq!(out["shoe_category"], json!("casual"));
        let comfort = out["comfort_level"].as_i64().unwrap();
        assert!((1..=10).contains(&comfort));
    }

    #[test]
    fn unaccented_name_infers_category() {
        let raw = attrs(json!({"name": "tenis de corrida", "size": 40}));
        let out = ShoeItem::new(raw.clone()).process_data(&raw);
        assert_eq!(out["shoe_category"], json!("esportivo"));
        assert_eq!(out["recommended_occasions"], json!(["esporte", "casual", "caminhada"]));
    }

    #[test]
    fn size_and_heel_ranges() {
        let item = ShoeItem::default();
        assert!(!item.validate_data(&attrs(json!({"name": "Bota", "size": "29"}))));
        assert!(!item.validate_data(&attrs(json!({"name": "Bota", "size": "grande"}))));
        assert!(!item.validate_data(&attrs(
            json!({"name": "Salto", "size": 37, "heel_height": 25})
        )));
        assert!(!item.validate_data(&attrs(
            json!({"name": "Bota", "size": 40, "shoe_category": "espacial"})
        )));
        assert!(item.validate_data(&attrs(
            json!({"name": "Salto", "size": 37, "heel_height": "9", "shoe_category": "Festa"})
        )));
    }

    #[test]
    fn comfort_is_clamped() {
        let comfy = attrs(json!({
            "heel_height": 0, "sole_type": "gel", "arch_support": true, "breathable": true
        }));
        assert_eq!(comfort_level(&comfy), 10);

        let harsh = attrs(json!({"heel_height": 12}));
        assert_eq!(comfort_level(&harsh), 3);
    }

    #[test]
    fn durability_combines_material_and_category() {
        let formal = ShoeItem::new(attrs(json!({"material_type": "couro", "shoe_category": "social"})));
        assert_eq!(formal.calculate_durability("novo"), 35);

        let runner = ShoeItem::new(attrs(json!({"material_type": "tecido", "shoe_category": "corrida"})));
        assert_eq!(runner.calculate_durability("usado_bom"), 6);
    }

    #[test]
    fn sport_shoes_get_extra_care() {
        let item = ShoeItem::new(attrs(json!({"material_type": "tecido", "shoe_category": "esportivo"})));
        let care = item.care_instructions();
        assert_eq!(care.len(), 8);
        assert_eq!(care.last().map(String::as_str), Some("Usar meias adequadas"));
    }

    #[test]
    fn boots_are_for_cold_seasons() {
        let item = ShoeItem::new(attrs(json!({"name": "Bota de couro"})));
        assert_eq!(item.recommended_seasons(), vec![Season::Autumn, Season::Winter]);
    }

    #[test]
    fn tags_describe_heel_and_features() {
        let raw = attrs(json!({"name": "Scarpin", "size": 36, "heel_height": 9, "waterproof": true}));
        let out = ShoeItem::new(raw.clone()).process_data(&raw);
        assert_eq!(
            out["auto_tags"],
            json!(["categoria_festa", "salto_alto", "a_prova_dagua"])
        );
    }

    #[test]
    fn process_is_idempotent() {
        let raw = attrs(json!({"name": "Tênis X", "size": "42", "sole_type": "borracha"}));
        let item = ShoeItem::new(raw.clone());
        let once = item.process_data(&raw);
        assert_eq!(item.process_data(&once), once);
    }
}
