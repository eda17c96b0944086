//! Built-in subscribers.

mod budget;
mod item;

pub use budget::{BudgetActivity, BudgetObserver};
pub use item::{ItemActivity, ItemObserver};
