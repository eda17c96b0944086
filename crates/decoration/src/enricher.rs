use serde::Serialize;

use closet_core::Attributes;

use crate::context::DecorationContext;

/// Priority given to enrichers that do not choose one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A unit of display-only enrichment.
///
/// Each enricher contributes one block, stored under its name in the
/// `decorations` map of the result. Lower priorities run first.
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Decides applicability from the raw item fields.
    fn should_apply(&self, _item: &Attributes, _ctx: &DecorationContext) -> bool {
        true
    }

    /// Builds this enricher's block.
    ///
    /// `item` is the running copy: the raw fields plus a `decorations` object
    /// holding the blocks of enrichers that ran earlier. An empty block adds
    /// nothing to the result.
    fn contribute(&self, item: &Attributes, ctx: &DecorationContext) -> anyhow::Result<Attributes>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnricherInfo {
    pub name: String,
    pub priority: i32,
}

impl EnricherInfo {
    pub fn of(enricher: &dyn Enricher) -> Self {
        Self {
            name: enricher.name().to_string(),
            priority: enricher.priority(),
        }
    }
}
