use serde_json::{Value, json};

use closet_core::{Attributes, AttributesExt, ItemCondition};

use crate::context::DecorationContext;
use crate::enricher::Enricher;
use crate::enrichers::frequency_band;

const DELICATE_FABRICS: [&str; 3] = ["seda", "la", "cashmere"];

/// Badge, styling tips and care reminders for favorited items.
#[derive(Debug, Clone, Copy, Default)]
pub struct FavoriteEnricher;

fn is_favorite(item: &Attributes) -> bool {
    item.is_present("is_favorite") || item.is_present("favorited_at")
}

fn style_tips(item: &Attributes) -> Vec<&'static str> {
    let mut tips = match item.lower_or("category_name", "").as_str() {
        "jeans" => vec![
            "Combine com camisetas básicas para um look casual",
            "Use com blazer para um visual mais arrumado",
        ],
        "vestido" => vec![
            "Adicione acessórios para variar o estilo",
            "Experimente diferentes calçados para ocasiões distintas",
        ],
        "blazer" => vec![
            "Versátil para looks casuais e formais",
            "Combine com jeans para um casual chic",
        ],
        _ => Vec::new(),
    };

    let colors = item.string_list("colors");
    if colors.iter().any(|c| c == "preto") {
        tips.push("Preto combina com qualquer cor - aproveite!");
    }
    if colors.iter().any(|c| c == "branco") {
        tips.push("Branco é atemporal e combina com tudo");
    }
    tips
}

fn care_reminders(item: &Attributes, frequency: &str) -> Vec<&'static str> {
    let mut reminders = vec!["Item favorito - cuidado extra recomendado"];

    let condition = item.scalar("condition");
    if condition.as_deref().unwrap_or(ItemCondition::DEFAULT_LABEL) != ItemCondition::New.as_str() {
        reminders.push("Verifique regularmente o estado de conservação");
    }
    if DELICATE_FABRICS.contains(&item.lower_or("fabric_type", "").as_str()) {
        reminders.push("Tecido delicado - considere lavagem profissional");
    }
    if matches!(frequency, "alta" | "muito_alta") {
        reminders.push("Uso frequente - atenção ao desgaste");
    }
    reminders
}

impl Enricher for FavoriteEnricher {
    fn name(&self) -> &str {
        "favorite"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn should_apply(&self, item: &Attributes, _ctx: &DecorationContext) -> bool {
        is_favorite(item)
    }

    fn contribute(&self, item: &Attributes, _ctx: &DecorationContext) -> anyhow::Result<Attributes> {
        if !is_favorite(item) {
            return Ok(Attributes::new());
        }

        let frequency = frequency_band(item.integer("usage_count").unwrap_or(0));
        let block = json!({
            "is_favorite": true,
            "favorite_badge": "⭐",
            "favorite_since": item.get("favorited_at").cloned().unwrap_or(Value::Null),
            "favorite_rank": item.integer("favorite_rank").unwrap_or(1),
            "usage_frequency": frequency,
            "style_tips": style_tips(item),
            "care_reminders": care_reminders(item, frequency),
        });
        match block {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("favorite block is not an object"),
        }
    }
}
