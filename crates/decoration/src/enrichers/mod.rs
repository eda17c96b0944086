//! Built-in enrichers.

mod favorite;
mod promotion;
mod usage;

pub use favorite::FavoriteEnricher;
pub use promotion::{Promotion, PromotionEnricher, PromotionTarget};
pub use usage::UsageEnricher;

/// Five-level usage banding shared by the favorite block.
pub(crate) fn frequency_band(uses: i64) -> &'static str {
    match uses {
        20.. => "muito_alta",
        10..=19 => "alta",
        5..=9 => "media",
        1..=4 => "baixa",
        _ => "nunca_usado",
    }
}
