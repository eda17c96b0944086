use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use closet_core::{Attributes, AttributesExt, attributes::round2};

use crate::context::DecorationContext;
use crate::enricher::Enricher;

/// Price assumed when an item has no purchase price.
const ESTIMATED_PRICE: f64 = 100.0;

/// What a promotion applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PromotionTarget {
    /// Category name contains the text, case-insensitively.
    CategoryContains(String),
    /// Brand equals the text, case-insensitively.
    Brand(String),
}

impl PromotionTarget {
    fn matches(&self, item: &Attributes) -> bool {
        match self {
            Self::CategoryContains(needle) => {
                let needle = needle.trim().to_lowercase();
                !needle.is_empty() && item.lower_or("category_name", "").contains(&needle)
            }
            Self::Brand(brand) => {
                let item_brand = item.lower_or("brand", "");
                !item_brand.is_empty() && item_brand == brand.to_lowercase()
            }
        }
    }
}

/// A store promotion from the catalogue the enricher is built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub discount_percentage: f64,
    pub store: String,
    /// Last day the promotion is valid, inclusive.
    pub valid_until: NaiveDate,
    pub target: PromotionTarget,
}

/// Active promotions, best discount and savings for the item's category or brand.
#[derive(Debug, Clone, Default)]
pub struct PromotionEnricher {
    catalogue: Vec<Promotion>,
}

impl PromotionEnricher {
    pub fn new(catalogue: Vec<Promotion>) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &[Promotion] {
        &self.catalogue
    }

    fn active_for<'a>(&'a self, item: &Attributes, ctx: &DecorationContext) -> Vec<&'a Promotion> {
        let today = ctx.today();
        self.catalogue
            .iter()
            .filter(|p| p.valid_until >= today && p.target.matches(item))
            .collect()
    }
}

/// First promotion with the strictly highest discount.
fn best<'a>(promotions: &[&'a Promotion]) -> Option<&'a Promotion> {
    promotions.iter().copied().fold(None, |found: Option<&Promotion>, p| match found {
        Some(b) if b.discount_percentage >= p.discount_percentage => Some(b),
        _ => Some(p),
    })
}

fn urgency(promotions: &[&Promotion], ctx: &DecorationContext) -> &'static str {
    let min_days_left = promotions
        .iter()
        .map(|p| ctx.days_until(p.valid_until))
        .filter(|days| *days >= 0)
        .min()
        .unwrap_or(i64::MAX);
    match min_days_left {
        ..=1 => "urgente",
        2..=7 => "alta",
        8..=30 => "media",
        _ => "baixa",
    }
}

fn savings(item: &Attributes, best: Option<&Promotion>) -> Value {
    let original = item.number("purchase_price").unwrap_or(ESTIMATED_PRICE);
    let Some(best) = best else {
        return json!({
            "original_price": original,
            "discounted_price": original,
            "savings_amount": 0,
            "savings_percentage": 0,
        });
    };
    let amount = original * best.discount_percentage / 100.0;
    json!({
        "original_price": original,
        "discounted_price": round2(original - amount),
        "savings_amount": round2(amount),
        "savings_percentage": best.discount_percentage,
    })
}

fn similar_items_on_sale(item: &Attributes) -> Vec<Value> {
    let mut similar = Vec::new();
    let category = item.scalar("category_name").unwrap_or_default();
    if !category.is_empty() {
        similar.push(json!({
            "name": format!("Outro item de {category}"),
            "discount": "25% off",
            "store": "Loja Online",
            "price": "R$ 89,90",
        }));
    }
    if let Some(color) = item.string_list("colors").first() {
        similar.push(json!({
            "name": format!("Item {color} similar"),
            "discount": "20% off",
            "store": "Fashion Store",
            "price": "R$ 79,90",
        }));
    }
    similar
}

impl Enricher for PromotionEnricher {
    fn name(&self) -> &str {
        "promotion"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn should_apply(&self, item: &Attributes, ctx: &DecorationContext) -> bool {
        !self.active_for(item, ctx).is_empty()
    }

    fn contribute(&self, item: &Attributes, ctx: &DecorationContext) -> anyhow::Result<Attributes> {
        let active = self.active_for(item, ctx);
        if active.is_empty() {
            return Ok(Attributes::new());
        }

        let best = best(&active);
        let mut block = Attributes::new();
        block.insert("has_promotions".into(), json!(true));
        block.insert("promotion_badge".into(), json!("🏷️"));
        block.insert("active_promotions".into(), serde_json::to_value(&active)?);
        block.insert("best_discount".into(), serde_json::to_value(best)?);
        block.insert("savings_potential".into(), savings(item, best));
        block.insert("promotion_urgency".into(), json!(urgency(&active, ctx)));
        block.insert("similar_items_on_sale".into(), Value::Array(similar_items_on_sale(item)));
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
        DecorationContext::new(Utc.with_ymd_and_hms(2024, 11, 25, 9, 0, 0).unwrap())
    }

    fn promo(id: u64, discount: f64, until: (i32, u32, u32), target: PromotionTarget) -> Promotion {
        Promotion {
            id,
            title: format!("Promo {id}"),
            description: String::new(),
            discount_percentage: discount,
            store: "Loja".into(),
            valid_until: NaiveDate::from_ymd_opt(until.0, until.1, until.2).unwrap(),
            target,
        }
    }

    fn enricher() -> PromotionEnricher {
        PromotionEnricher::new(vec![
            promo(1, 30.0, (2024, 12, 31), PromotionTarget::CategoryContains("camiseta".into())),
            promo(2, 40.0, (2024, 11, 30), PromotionTarget::Brand("Nike".into())),
            promo(3, 90.0, (2024, 1, 1), PromotionTarget::Brand("Nike".into())),
        ])
    }

    #[test]
    fn expired_and_unmatched_promotions_do_not_apply() {
        let e = enricher();
        assert!(!e.should_apply(&attrs(json!({"category_name": "Calça", "brand": "Zara"})), &ctx()));
        assert!(e.should_apply(&attrs(json!({"category_name": "Camiseta Polo"})), &ctx()));
        assert!(e.should_apply(&attrs(json!({"brand": "NIKE"})), &ctx()));
    }

    #[test]
    fn blank_targets_match_nothing() {
        let e = PromotionEnricher::new(vec![
            promo(1, 50.0, (2024, 12, 31), PromotionTarget::CategoryContains(String::new())),
            promo(2, 50.0, (2024, 12, 31), PromotionTarget::Brand("  ".into())),
        ]);
        assert!(!e.should_apply(&attrs(json!({"category_name": "Camiseta"})), &ctx()));
        assert!(!e.should_apply(&attrs(json!({"name": "Sem categoria"})), &ctx()));
    }

    #[test]
    fn best_discount_drives_savings_and_urgency() {
        let item = attrs(json!({
            "category_name": "camiseta",
            "brand": "nike",
            "purchase_price": "80",
            "colors": ["azul"],
        }));
        let block = enricher().contribute(&item, &ctx()).unwrap();

        assert_eq!(block["active_promotions"].as_array().map(Vec::len), Some(2));
        assert_eq!(block["best_discount"]["id"], json!(2));
        assert_eq!(block["savings_potential"]["discounted_price"], json!(48.0));
        assert_eq!(block["savings_potential"]["savings_amount"], json!(32.0));
        assert_eq!(block["promotion_urgency"], json!("alta"));
        assert_eq!(block["similar_items_on_sale"][0]["name"], json!("Outro item de camiseta"));
        assert_eq!(block["similar_items_on_sale"][1]["name"], json!("Item azul similar"));
    }

    #[test]
    fn missing_price_uses_estimate() {
        let block = enricher()
            .contribute(&attrs(json!({"category_name": "camisetas"})), &ctx())
            .unwrap();
        assert_eq!(block["savings_potential"]["original_price"], json!(100.0));
        assert_eq!(block["savings_potential"]["discounted_price"], json!(70.0));
        assert_eq!(block["promotion_urgency"], json!("baixa"));
    }

    #[test]
    fn urgency_bands() {
        let ending = |d| promo(9, 10.0, (2024, 11, d), PromotionTarget::Brand("x".into()));
        assert_eq!(urgency(&[&ending(26)], &ctx()), "urgente");
        assert_eq!(urgency(&[&ending(30)], &ctx()), "alta");
        assert_eq!(urgency(&[&ending(20)], &ctx()), "baixa");
        let far = promo(9, 10.0, (2025, 3, 1), PromotionTarget::Brand("x".into()));
        assert_eq!(urgency(&[&far], &ctx()), "baixa");
    }

    #[test]
    fn best_keeps_first_on_ties() {
        let a = promo(1, 20.0, (2025, 1, 1), PromotionTarget::Brand("a".into()));
        let b = promo(2, 20.0, (2025, 1, 1), PromotionTarget::Brand("b".into()));
        assert_eq!(best(&[&a, &b]).map(|p| p.id), Some(1));
        assert!(best(&[]).is_none());
    }
}
