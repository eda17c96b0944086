//! Priority-ordered decoration pipeline.
//!
//! `decorate` turns a stored item into a display record without touching the
//! stored fields:
//!
//! 1. pick the requested enrichers (all of them by default, registration order)
//! 2. keep those whose `should_apply` accepts the raw item
//! 3. stable-sort them by ascending priority
//! 4. run each against a running copy of the item that carries the blocks
//!    gathered so far, so later enrichers can build on earlier ones
//!
//! ## Failure isolation
//!
//! An enricher that returns an error or panics is logged and left out of
//! `applied_decorators`; the others still run. With `skip_invalid: false`
//! the first failure (or an unknown enricher name) is returned instead.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use closet_core::{Attributes, Clock, EngineError, EngineResult, SystemClock};

use crate::context::DecorationContext;
use crate::enricher::{Enricher, EnricherInfo};
use crate::enrichers::{FavoriteEnricher, Promotion, PromotionEnricher, UsageEnricher};
use crate::result::{DECORATIONS_KEY, DecorationMetadata, DecorationResult, METADATA_KEY};

/// Pipeline switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecorationOptions {
    /// Run applicable enrichers by ascending priority instead of selection order.
    pub auto_sort_by_priority: bool,
    /// Log registrations and a summary per decorated item at `info`.
    pub log_decorations: bool,
    /// Skip unknown or failing enrichers instead of returning an error.
    pub skip_invalid: bool,
}

impl Default for DecorationOptions {
    fn default() -> Self {
        Self {
            auto_sort_by_priority: true,
            log_decorations: true,
            skip_invalid: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecorationStats {
    pub registered_decorators: usize,
    pub decorator_names: Vec<String>,
    pub options: DecorationOptions,
}

pub struct DecorationPipeline {
    enrichers: Vec<Arc<dyn Enricher>>,
    promotions: Vec<Promotion>,
    options: DecorationOptions,
    clock: Arc<dyn Clock>,
}

impl core::fmt::Debug for DecorationPipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecorationPipeline")
            .field("enrichers", &self.names())
            .field("promotions", &self.promotions.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Default for DecorationPipeline {
    fn default() -> Self {
        Self::with_defaults(Arc::new(SystemClock), Vec::new())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

fn item_id(item: &Attributes) -> String {
    item.get("id")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "unknown".to_string())
}

impl DecorationPipeline {
    /// Pipeline with no enrichers.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_options(clock, DecorationOptions::default())
    }

    pub fn with_options(clock: Arc<dyn Clock>, options: DecorationOptions) -> Self {
        Self {
            enrichers: Vec::new(),
            promotions: Vec::new(),
            options,
            clock,
        }
    }

    /// Pipeline with the `favorite`, `promotion` and `usage` enrichers; the
    /// promotion enricher reads `promotions`.
    pub fn with_defaults(clock: Arc<dyn Clock>, promotions: Vec<Promotion>) -> Self {
        let mut pipeline = Self::new(clock);
        pipeline.promotions = promotions;
        pipeline.register_defaults();
        pipeline
    }

    fn register_defaults(&mut self) {
        self.register(Arc::new(FavoriteEnricher));
        self.register(Arc::new(PromotionEnricher::new(self.promotions.clone())));
        self.register(Arc::new(UsageEnricher));
    }

    fn names(&self) -> Vec<String> {
        self.enrichers.iter().map(|e| e.name().to_string()).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Enricher>> {
        self.enrichers.iter().find(|e| e.name() == name)
    }

    /// Adds `enricher`, replacing one with the same name in place.
    pub fn register(&mut self, enricher: Arc<dyn Enricher>) {
        if self.options.log_decorations {
            tracing::info!(
                enricher = enricher.name(),
                priority = enricher.priority(),
                "enricher registered"
            );
        }
        match self.enrichers.iter_mut().find(|e| e.name() == enricher.name()) {
            Some(slot) => *slot = enricher,
            None => self.enrichers.push(enricher),
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.enrichers.len();
        self.enrichers.retain(|e| e.name() != name);
        let removed = self.enrichers.len() < before;
        if removed && self.options.log_decorations {
            tracing::info!(enricher = name, "enricher removed");
        }
        removed
    }

    pub fn has_enricher(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn registered(&self) -> Vec<EnricherInfo> {
        self.enrichers.iter().map(|e| EnricherInfo::of(e.as_ref())).collect()
    }

    pub fn clear(&mut self) {
        let count = self.enrichers.len();
        self.enrichers.clear();
        if self.options.log_decorations {
            tracing::info!(count, "all enrichers removed");
        }
    }

    /// Drops every registration and re-registers the built-in enrichers.
    pub fn reset_to_defaults(&mut self) {
        self.clear();
        self.register_defaults();
        if self.options.log_decorations {
            tracing::info!("enrichers reset to defaults");
        }
    }

    pub fn stats(&self) -> DecorationStats {
        DecorationStats {
            registered_decorators: self.enrichers.len(),
            decorator_names: self.names(),
            options: self.options,
        }
    }

    pub fn options(&self) -> DecorationOptions {
        self.options
    }

    pub fn configure(&mut self, options: DecorationOptions) {
        self.options = options;
        if options.log_decorations {
            tracing::info!(?options, "decoration pipeline configured");
        }
    }

    fn select(&self, names: Option<&[&str]>) -> EngineResult<Vec<Arc<dyn Enricher>>> {
        let Some(names) = names else {
            return Ok(self.enrichers.clone());
        };

        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match self.find(name) {
                Some(enricher) => selected.push(Arc::clone(enricher)),
                None if self.options.skip_invalid => {
                    tracing::debug!(enricher = *name, "requested enricher not registered, skipped");
                }
                None => return Err(EngineError::UnknownEnricher(name.to_string())),
            }
        }
        Ok(selected)
    }

    fn run(enricher: &dyn Enricher, item: &Attributes, ctx: &DecorationContext) -> Result<Attributes, String> {
        match catch_unwind(AssertUnwindSafe(|| enricher.contribute(item, ctx))) {
            Ok(Ok(block)) => Ok(block),
            Ok(Err(err)) => Err(format!("{err:#}")),
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }

    /// Decorates one item with the named enrichers, or with all of them.
    pub fn decorate(&self, item: &Attributes, names: Option<&[&str]>) -> EngineResult<DecorationResult> {
        let started = Instant::now();
        let ctx = DecorationContext::new(self.clock.now());

        let mut fields = item.clone();
        fields.remove(DECORATIONS_KEY);
        fields.remove(METADATA_KEY);

        let mut applicable: Vec<_> = self
            .select(names)?
            .into_iter()
            .filter(|e| e.should_apply(&fields, &ctx))
            .collect();
        if self.options.auto_sort_by_priority {
            applicable.sort_by_key(|e| e.priority());
        }

        let mut working = fields.clone();
        working.insert(DECORATIONS_KEY.to_string(), Value::Object(Attributes::new()));
        let mut applied = Vec::with_capacity(applicable.len());

        for enricher in &applicable {
            match Self::run(enricher.as_ref(), &working, &ctx) {
                Ok(block) => {
                    if !block.is_empty() {
                        if let Some(Value::Object(decorations)) = working.get_mut(DECORATIONS_KEY) {
                            decorations.insert(enricher.name().to_string(), Value::Object(block));
                        }
                    }
                    applied.push(enricher.name().to_string());
                }
                Err(reason) => {
                    tracing::error!(
                        enricher = enricher.name(),
                        item_id = %item_id(item),
                        error = %reason,
                        "enricher failed"
                    );
                    if !self.options.skip_invalid {
                        return Err(EngineError::EnricherFailure {
                            enricher: enricher.name().to_string(),
                            reason,
                        });
                    }
                }
            }
        }

        let decorations = match working.remove(DECORATIONS_KEY) {
            Some(Value::Object(map)) => map,
            _ => Attributes::new(),
        };
        let execution_time = started.elapsed().as_secs_f64();

        if self.options.log_decorations {
            tracing::info!(
                item_id = %item_id(item),
                applied_decorators = ?applied,
                execution_time,
                "item decorated"
            );
        }

        Ok(DecorationResult {
            fields,
            decorations,
            decoration_metadata: DecorationMetadata {
                decorators_applied: applied.len(),
                applied_decorators: applied,
                execution_time,
                total_decorators_available: self.enrichers.len(),
                decorated_at: ctx.now,
            },
        })
    }

    /// Decorates each item independently.
    pub fn decorate_items(&self, items: &[Attributes], names: Option<&[&str]>) -> EngineResult<Vec<DecorationResult>> {
        let started = Instant::now();
        let decorated = items
            .iter()
            .map(|item| self.decorate(item, names))
            .collect::<EngineResult<Vec<_>>>()?;

        if self.options.log_decorations {
            tracing::info!(
                items_count = items.len(),
                execution_time = started.elapsed().as_secs_f64(),
                "items decorated"
            );
        }
        Ok(decorated)
    }

    /// Runs one enricher outside the pipeline and returns the item with its
    /// block merged in. Items the enricher does not apply to come back as-is.
    pub fn apply_single(&self, item: &Attributes, name: &str) -> EngineResult<Attributes> {
        let enricher = self
            .find(name)
            .ok_or_else(|| EngineError::UnknownEnricher(name.to_string()))?;
        let ctx = DecorationContext::new(self.clock.now());
        if !enricher.should_apply(item, &ctx) {
            return Ok(item.clone());
        }

        let block = Self::run(enricher.as_ref(), item, &ctx).map_err(|reason| EngineError::EnricherFailure {
            enricher: name.to_string(),
            reason,
        })?;

        let mut record = item.clone();
        if !block.is_empty() {
            let decorations = record
                .entry(DECORATIONS_KEY)
                .or_insert_with(|| Value::Object(Attributes::new()));
            if !decorations.is_object() {
                *decorations = Value::Object(Attributes::new());
            }
            if let Value::Object(map) = decorations {
                map.insert(name.to_string(), Value::Object(block));
            }
        }
        Ok(record)
    }
}
