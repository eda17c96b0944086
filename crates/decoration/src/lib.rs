//! Decoration pipeline.
//!
//! Builds display records from stored items: priority-ordered enrichers each
//! contribute one named block, and the stored fields are never modified.

pub mod context;
pub mod enricher;
pub mod enrichers;
pub mod pipeline;
pub mod result;

pub use context::{DecorationContext, parse_date};
pub use enricher::{DEFAULT_PRIORITY, Enricher, EnricherInfo};
pub use enrichers::{FavoriteEnricher, Promotion, PromotionEnricher, PromotionTarget, UsageEnricher};
pub use pipeline::{DecorationOptions, DecorationPipeline, DecorationStats};
pub use result::{DECORATIONS_KEY, DecorationMetadata, DecorationResult, METADATA_KEY};
