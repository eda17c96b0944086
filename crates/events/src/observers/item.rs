use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, anyhow};
use serde::Serialize;

use closet_core::{Attributes, AttributesExt, ItemCondition};

use crate::event::names;
use crate::subscriber::Subscriber;

/// Running tallies kept by [`ItemObserver`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemActivity {
    /// Net items owned per user.
    pub items_per_user: BTreeMap<i64, i64>,
    /// Net favorites per user.
    pub favorites_per_user: BTreeMap<i64, i64>,
    /// Net favorites per user and category.
    pub category_preference: BTreeMap<i64, BTreeMap<String, i64>>,
    /// Net items per category.
    pub items_per_category: BTreeMap<String, i64>,
    /// Times each item was worn.
    pub wear_counts: BTreeMap<i64, u64>,
    /// Times items of each category were worn.
    pub wear_per_category: BTreeMap<String, u64>,
    /// Items whose condition got worse and need care.
    pub care_suggestions: Vec<i64>,
    /// Items sold and deactivated.
    pub sold_items: Vec<i64>,
    pub sales_total: f64,
}

/// Tracks the item life cycle: creation, edits, favorites, wear and sale.
#[derive(Debug, Default)]
pub struct ItemObserver {
    activity: Mutex<ItemActivity>,
}

fn required_id(payload: &Attributes, key: &str) -> anyhow::Result<i64> {
    payload
        .integer(key)
        .ok_or_else(|| anyhow!("payload is missing numeric '{key}'"))
}

fn required_text(payload: &Attributes, key: &str) -> anyhow::Result<String> {
    payload
        .scalar(key)
        .ok_or_else(|| anyhow!("payload is missing '{key}'"))
}

fn condition_rank(label: &str) -> Option<usize> {
    ItemCondition::ALL.iter().position(|c| c.as_str() == label)
}

impl ItemObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self) -> ItemActivity {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with_activity<R>(&self, f: impl FnOnce(&mut ItemActivity) -> R) -> R {
        let mut activity = self.activity.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut activity)
    }

    fn on_created(&self, item_id: i64, payload: &Attributes) -> anyhow::Result<()> {
        let user_id = required_id(payload, "user_id")?;
        let category = payload.scalar("category").unwrap_or_else(|| "unknown".to_string());
        self.with_activity(|a| {
            *a.items_per_user.entry(user_id).or_insert(0) += 1;
            *a.items_per_category.entry(category.clone()).or_insert(0) += 1;
        });
        tracing::debug!(item_id, user_id, category = %category, "item created processed");
        Ok(())
    }

    fn on_updated(&self, item_id: i64, payload: &Attributes) -> anyhow::Result<()> {
        if let (Some(old), Some(new)) = (payload.scalar("old_category"), payload.scalar("new_category")) {
            if old != new {
                self.with_activity(|a| {
                    *a.items_per_category.entry(old.clone()).or_insert(0) -= 1;
                    *a.items_per_category.entry(new.clone()).or_insert(0) += 1;
                });
                tracing::debug!(item_id, from = %old, to = %new, "category change processed");
            }
        }

        if let (Some(old), Some(new)) = (payload.scalar("old_condition"), payload.scalar("new_condition")) {
            let worsened = match (condition_rank(&old), condition_rank(&new)) {
                (Some(o), Some(n)) => n > o,
                _ => false,
            };
            if worsened {
                self.with_activity(|a| a.care_suggestions.push(item_id));
                tracing::debug!(item_id, condition = %new, "care suggested after condition change");
            }
        }
        Ok(())
    }

    fn on_deleted(&self, item_id: i64, payload: &Attributes) -> anyhow::Result<()> {
        let user_id = required_id(payload, "user_id")?;
        let category = required_text(payload, "category")?;
        self.with_activity(|a| {
            *a.items_per_user.entry(user_id).or_insert(0) -= 1;
            *a.items_per_category.entry(category).or_insert(0) -= 1;
            a.wear_counts.remove(&item_id);
        });
        Ok(())
    }

    fn on_favorite(&self, payload: &Attributes, delta: i64) -> anyhow::Result<()> {
        let user_id = required_id(payload, "user_id")?;
        let category = required_text(payload, "category")?;
        self.with_activity(|a| {
            *a.favorites_per_user.entry(user_id).or_insert(0) += delta;
            *a.category_preference
                .entry(user_id)
                .or_default()
                .entry(category)
                .or_insert(0) += delta;
        });
        Ok(())
    }

    fn on_worn(&self, item_id: i64, payload: &Attributes) -> anyhow::Result<()> {
        let category = required_text(payload, "category")?;
        self.with_activity(|a| {
            *a.wear_counts.entry(item_id).or_insert(0) += 1;
            *a.wear_per_category.entry(category).or_insert(0) += 1;
        });
        Ok(())
    }

    fn on_sold(&self, item_id: i64, payload: &Attributes) -> anyhow::Result<()> {
        let price = payload.number("sale_price").unwrap_or(0.0);
        self.with_activity(|a| {
            a.sold_items.push(item_id);
            a.sales_total += price;
        });
        tracing::debug!(item_id, sale_price = price, "item sale processed");
        Ok(())
    }
}

impl Subscriber for ItemObserver {
    fn name(&self) -> &str {
        "item_observer"
    }

    fn interests(&self) -> Vec<String> {
        [
            names::ITEM_CREATED,
            names::ITEM_UPDATED,
            names::ITEM_DELETED,
            names::ITEM_FAVORITED,
            names::ITEM_UNFAVORITED,
            names::ITEM_WORN,
            names::ITEM_SOLD,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn handle(&self, event: &str, payload: &Attributes) -> anyhow::Result<()> {
        let item_id = required_id(payload, "item_id").with_context(|| format!("handling {event}"))?;
        tracing::info!(event, item_id, "item observer processing event");

        let result = match event {
            names::ITEM_CREATED => self.on_created(item_id, payload),
            names::ITEM_UPDATED => self.on_updated(item_id, payload),
            names::ITEM_DELETED => self.on_deleted(item_id, payload),
            names::ITEM_FAVORITED => self.on_favorite(payload, 1),
            names::ITEM_UNFAVORITED => self.on_favorite(payload, -1),
            names::ITEM_WORN => self.on_worn(item_id, payload),
            names::ITEM_SOLD => self.on_sold(item_id, payload),
            _ => Ok(()),
        };
        result.with_context(|| format!("handling {event} for item {item_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn payload(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn created_requires_item_and_user() {
        let observer = ItemObserver::new();
        let err = observer
            .handle(names::ITEM_CREATED, &payload(json!({"user_id": 1})))
            .unwrap_err();
        assert!(format!("{err:#}").contains("item_id"));

        let err = observer
            .handle(names::ITEM_CREATED, &payload(json!({"item_id": 1})))
            .unwrap_err();
        assert!(format!("{err:#}").contains("user_id"));

        observer
            .handle(names::ITEM_CREATED, &payload(json!({"item_id": 1, "user_id": 7, "category": "camiseta"})))
            .unwrap();
        let activity = observer.activity();
        assert_eq!(activity.items_per_user[&7], 1);
        assert_eq!(activity.items_per_category["camiseta"], 1);
    }

    #[test]
    fn favorite_and_unfavorite_balance_out() {
        let observer = ItemObserver::new();
        let data = payload(json!({"item_id": "3", "user_id": "9", "category": "bolsa"}));
        observer.handle(names::ITEM_FAVORITED, &data).unwrap();
        observer.handle(names::ITEM_FAVORITED, &data).unwrap();
        observer.handle(names::ITEM_UNFAVORITED, &data).unwrap();

        let activity = observer.activity();
        assert_eq!(activity.favorites_per_user[&9], 1);
        assert_eq!(activity.category_preference[&9]["bolsa"], 1);
    }

    #[test]
    fn worn_counts_usage_and_needs_category() {
        let observer = ItemObserver::new();
        observer
            .handle(names::ITEM_WORN, &payload(json!({"item_id": 4, "category": "tenis"})))
            .unwrap();
        observer
            .handle(names::ITEM_WORN, &payload(json!({"item_id": 4, "category": "tenis"})))
            .unwrap();
        assert!(observer.handle(names::ITEM_WORN, &payload(json!({"item_id": 4}))).is_err());

        let activity = observer.activity();
        assert_eq!(activity.wear_counts[&4], 2);
        assert_eq!(activity.wear_per_category["tenis"], 2);
    }

    #[test]
    fn worse_condition_suggests_care() {
        let observer = ItemObserver::new();
        observer
            .handle(
                names::ITEM_UPDATED,
                &payload(json!({"item_id": 5, "old_condition": "novo", "new_condition": "usado_regular"})),
            )
            .unwrap();
        observer
            .handle(
                names::ITEM_UPDATED,
                &payload(json!({"item_id": 6, "old_condition": "usado_regular", "new_condition": "novo"})),
            )
            .unwrap();
        assert_eq!(observer.activity().care_suggestions, vec![5]);
    }

    #[test]
    fn sale_accumulates_total() {
        let observer = ItemObserver::new();
        observer
            .handle(names::ITEM_SOLD, &payload(json!({"item_id": 8, "sale_price": "49.90"})))
            .unwrap();
        let activity = observer.activity();
        assert_eq!(activity.sold_items, vec![8]);
        assert!((activity.sales_total - 49.9).abs() < 1e-9);
    }
}
