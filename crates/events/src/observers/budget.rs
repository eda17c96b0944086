use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use closet_core::{Attributes, AttributesExt};

use crate::event::names;
use crate::subscriber::Subscriber;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetActivity {
    pub exceeded_alerts: usize,
    pub warnings: usize,
    pub purchases: usize,
    pub purchases_total: f64,
}

/// Reacts to budget alerts and purchases.
#[derive(Debug, Default)]
pub struct BudgetObserver {
    activity: Mutex<BudgetActivity>,
}

impl BudgetObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self) -> BudgetActivity {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Subscriber for BudgetObserver {
    fn name(&self) -> &str {
        "budget_observer"
    }

    fn interests(&self) -> Vec<String> {
        [
            names::BUDGET_CREATED,
            names::BUDGET_UPDATED,
            names::BUDGET_EXCEEDED,
            names::BUDGET_WARNING,
            names::PURCHASE_MADE,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn handle(&self, event: &str, payload: &Attributes) -> anyhow::Result<()> {
        let budget_id = payload.integer("budget_id");
        tracing::info!(event, ?budget_id, "budget observer processing event");

        let mut activity = self.activity.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            names::BUDGET_EXCEEDED => {
                activity.exceeded_alerts += 1;
                tracing::warn!(?budget_id, spent = ?payload.number("spent"), "budget exceeded");
            }
            names::BUDGET_WARNING => {
                activity.warnings += 1;
                tracing::info!(?budget_id, "budget close to its limit");
            }
            names::PURCHASE_MADE => {
                let amount = payload.number("amount").unwrap_or(0.0);
                activity.purchases += 1;
                activity.purchases_total += amount;
                tracing::info!(?budget_id, amount, "purchase recorded");
            }
            _ => {}
        }
        Ok(())
    }
}
