use serde_json::{Value, json};

use closet_core::{Attributes, AttributesExt, Season, attributes::round2};

use crate::context::{DecorationContext, parse_date};
use crate::enricher::Enricher;
use crate::result::DECORATIONS_KEY;

/// Wear statistics, patterns, recommendations and cost per wear.
///
/// Applies to every item. When the favorite block ran first, favorites get
/// their own pattern and recommendation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageEnricher;

fn usage_frequency(uses: i64) -> &'static str {
    match uses {
        50.. => "muito_alta",
        20..=49 => "alta",
        10..=19 => "media",
        5..=9 => "baixa",
        1..=4 => "muito_baixa",
        _ => "nunca",
    }
}

fn frequency_pattern(uses: i64) -> &'static str {
    match uses {
        20.. => "item_essencial",
        10..=19 => "uso_regular",
        5..=9 => "uso_ocasional",
        1..=4 => "uso_raro",
        _ => "nunca_usado",
    }
}

fn recency_pattern(days_since_last_use: i64) -> Option<&'static str> {
    match days_since_last_use {
        366.. => Some("esquecido"),
        181..=365 => Some("pouco_usado_recentemente"),
        ..=7 => Some("usado_recentemente"),
        _ => None,
    }
}

fn favorite_block(item: &Attributes) -> Option<&Attributes> {
    item.get(DECORATIONS_KEY)?.get("favorite")?.as_object()
}

struct Usage {
    uses: i64,
    days_since_last_use: Option<i64>,
}

impl Usage {
    fn read(item: &Attributes, ctx: &DecorationContext) -> Self {
        Self {
            uses: item.integer("usage_count").unwrap_or(0),
            days_since_last_use: item
                .text("last_worn")
                .and_then(parse_date)
                .map(|d| ctx.days_since(d)),
        }
    }

    fn patterns(&self, is_favorite: bool) -> Vec<&'static str> {
        let mut patterns = vec![frequency_pattern(self.uses)];
        if let Some(p) = self.days_since_last_use.and_then(recency_pattern) {
            patterns.push(p);
        }
        if is_favorite {
            patterns.push("item_favorito");
        }
        patterns
    }
}

fn stats(item: &Attributes, usage: &Usage, ctx: &DecorationContext) -> Value {
    let average_per_month = item
        .text("first_worn")
        .and_then(parse_date)
        .filter(|_| usage.uses > 0)
        .map(|first| round2(usage.uses as f64 / ctx.months_since(first).max(1) as f64));

    json!({
        "total_uses": usage.uses,
        "last_worn": item.get("last_worn").cloned().unwrap_or(Value::Null),
        "first_worn": item.get("first_worn").cloned().unwrap_or(Value::Null),
        "usage_frequency": usage_frequency(usage.uses),
        "days_since_last_use": usage.days_since_last_use,
        "average_uses_per_month": average_per_month,
    })
}

fn recommendations(patterns: &[&str]) -> Vec<Value> {
    let rules = [
        ("nunca_usado", "suggestion", "Que tal experimentar este item? Ainda não foi usado!", "try_on"),
        (
            "esquecido",
            "reminder",
            "Este item não é usado há mais de um ano. Considere doá-lo ou vendê-lo.",
            "consider_removal",
        ),
        (
            "item_essencial",
            "care",
            "Item muito usado! Verifique o estado e considere cuidados especiais.",
            "check_condition",
        ),
        ("uso_regular", "suggestion", "Item versátil! Experimente combinações diferentes.", "try_combinations"),
        (
            "item_favorito",
            "suggestion",
            "Um dos seus favoritos! Registre cada uso para acompanhar o custo por uso.",
            "track_usage",
        ),
    ];
    rules
        .iter()
        .filter(|(pattern, ..)| patterns.contains(pattern))
        .map(|(_, kind, message, action)| json!({"type": kind, "message": message, "action": action}))
        .collect()
}

fn cost_per_wear(item: &Attributes, uses: i64) -> Value {
    let price = item.number("purchase_price").unwrap_or(0.0);
    if uses <= 0 {
        return json!({
            "cost_per_wear": null,
            "total_cost": price,
            "total_uses": 0,
            "value_rating": "not_used",
        });
    }

    let per_wear = price / uses as f64;
    let rating = match per_wear {
        c if c <= 5.0 => "excellent",
        c if c <= 15.0 => "good",
        c if c <= 30.0 => "fair",
        _ => "poor",
    };
    json!({
        "cost_per_wear": round2(per_wear),
        "total_cost": price,
        "total_uses": uses,
        "value_rating": rating,
    })
}

fn seasonal(item: &Attributes, ctx: &DecorationContext) -> Value {
    let season = item.scalar("season").unwrap_or_else(|| Season::All.as_str().to_string());
    let current = ctx.current_season();
    let recommendation = if season == Season::All.as_str() {
        "Item versátil para qualquer estação".to_string()
    } else if season == current.as_str() {
        "Perfeito para a estação atual!".to_string()
    } else {
        format!("Melhor para {season}. Guarde para a próxima estação.")
    };

    json!({
        "preferred_season": season,
        "current_season": current.as_str(),
        "in_season": season == Season::All.as_str() || season == current.as_str(),
        "seasonal_recommendation": recommendation,
    })
}

fn occasion(item: &Attributes) -> Value {
    let occasion = item.scalar("occasion").unwrap_or_else(|| "casual".to_string());
    let versatility = if matches!(occasion.as_str(), "casual" | "todas") {
        "alta"
    } else {
        "especifica"
    };
    let suggestions: &[&str] = match occasion.as_str() {
        "casual" => &["trabalho", "encontros", "compras"],
        "trabalho" => &["reuniões", "apresentações", "eventos corporativos"],
        "festa" => &["casamentos", "aniversários", "eventos sociais"],
        "esporte" => &["academia", "caminhada", "atividades ao ar livre"],
        _ => &["casual", "trabalho"],
    };

    json!({
        "primary_occasion": occasion,
        "versatility": versatility,
        "occasion_suggestions": suggestions,
    })
}

impl Enricher for UsageEnricher {
    fn name(&self) -> &str {
        "usage"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn contribute(&self, item: &Attributes, ctx: &DecorationContext) -> anyhow::Result<Attributes> {
        let usage = Usage::read(item, ctx);
        let patterns = usage.patterns(favorite_block(item).is_some());

        let mut block = Attributes::new();
        block.insert("usage_stats".into(), stats(item, &usage, ctx));
        block.insert("usage_patterns".into(), json!(patterns));
        block.insert("recommendations".into(), Value::Array(recommendations(&patterns)));
        block.insert("cost_per_wear".into(), cost_per_wear(item, usage.uses));
        block.insert("seasonal_usage".into(), seasonal(item, ctx));
        block.insert("occasion_usage".into(), occasion(item));
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn ctx() -> DecorationContext {
        DecorationContext::new(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap())
    }

    #[test]
    fn never_worn_item() {
        let block = UsageEnricher.contribute(&attrs(json!({"purchase_price": 120})), &ctx()).unwrap();
        assert_eq!(block["usage_stats"]["usage_frequency"], json!("nunca"));
        assert_eq!(block["usage_stats"]["days_since_last_use"], Value::Null);
        assert_eq!(block["usage_patterns"], json!(["nunca_usado"]));
        assert_eq!(block["recommendations"][0]["action"], json!("try_on"));
        assert_eq!(block["cost_per_wear"]["value_rating"], json!("not_used"));
        assert_eq!(block["cost_per_wear"]["total_cost"], json!(120.0));
    }

    #[test]
    fn heavily_worn_item_with_history() {
        let item = attrs(json!({
            "usage_count": "24",
            "purchase_price": "96",
            "first_worn": "2024-01-15",
            "last_worn": "2024-07-10",
            "season": "inverno",
            "occasion": "trabalho",
        }));
        let block = UsageEnricher.contribute(&item, &ctx()).unwrap();

        assert_eq!(block["usage_stats"]["usage_frequency"], json!("alta"));
        assert_eq!(block["usage_stats"]["days_since_last_use"], json!(5));
        assert_eq!(block["usage_stats"]["average_uses_per_month"], json!(4.0));
        assert_eq!(block["usage_patterns"], json!(["item_essencial", "usado_recentemente"]));
        assert_eq!(block["recommendations"][0]["action"], json!("check_condition"));
        assert_eq!(block["cost_per_wear"]["cost_per_wear"], json!(4.0));
        assert_eq!(block["cost_per_wear"]["value_rating"], json!("excellent"));
        assert_eq!(block["seasonal_usage"]["in_season"], json!(true));
        assert_eq!(block["occasion_usage"]["versatility"], json!("especifica"));
    }

    #[test]
    fn forgotten_item_out_of_season() {
        let item = attrs(json!({"usage_count": 3, "last_worn": "2023-01-01", "season": "verao"}));
        let block = UsageEnricher.contribute(&item, &ctx()).unwrap();
        assert_eq!(block["usage_patterns"], json!(["uso_raro", "esquecido"]));
        assert_eq!(block["recommendations"][0]["action"], json!("consider_removal"));
        assert_eq!(block["seasonal_usage"]["in_season"], json!(false));
        assert_eq!(
            block["seasonal_usage"]["seasonal_recommendation"],
            json!("Melhor para verao. Guarde para a próxima estação.")
        );
        assert_eq!(block["occasion_usage"]["occasion_suggestions"], json!(["trabalho", "encontros", "compras"]));
    }

    #[test]
    fn reads_favorite_block_from_earlier_enricher() {
        let item = attrs(json!({
            "usage_count": 12,
            "decorations": {"favorite": {"is_favorite": true}},
        }));
        let block = UsageEnricher.contribute(&item, &ctx()).unwrap();
        assert_eq!(block["usage_patterns"], json!(["uso_regular", "item_favorito"]));
        let actions: Vec<_> = block["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["action"].clone())
            .collect();
        assert_eq!(actions, [json!("try_combinations"), json!("track_usage")]);
    }
}
