//! Built-in filter strategies over the item table.

mod category;
mod color;
mod condition;
mod season;

pub use category::CategoryFilter;
pub use color::{COLORS, ColorFilter};
pub use condition::ConditionFilter;
pub use season::SeasonFilter;
