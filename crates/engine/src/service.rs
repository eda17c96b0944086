//! Item service: the caller that ties the four components together.
//!
//! ## Write path
//! resolve the category to a descriptor, validate, process, persist, then
//! publish the matching `item.*` event.
//!
//! ## Read path
//! clone the prototype filter engine, activate the request's filters, run the
//! composed [`MemoryQuery`] over the stored records, then decorate each hit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use closet_catalog::TypeRegistry;
use closet_core::{Attributes, AttributesExt, Clock, EngineError, EngineResult, SystemClock};
use closet_decoration::{DecorationPipeline, DecorationResult, Promotion};
use closet_events::{
    BudgetObserver, DomainEvent, EventPublisher, InMemoryEventBus, ItemObserver, names,
};
use closet_filters::{ActiveFilter, FilterEngine, MemoryQuery, Query};

use crate::config::EngineOptions;
use crate::store::{InMemoryItemStore, ItemStore, NewItem, StoredItem};

/// Listing request: owner scope, filters in activation order, and the
/// enrichers to run (`None` runs every registered one).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub user_id: Option<u64>,
    pub filters: Vec<ActiveFilter>,
    pub enrichers: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn for_user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn filter(mut self, name: &str, value: Value) -> Self {
        self.filters.push(ActiveFilter {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn enrichers(mut self, names: &[&str]) -> Self {
        self.enrichers = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }
}

pub struct ItemService<S, P> {
    registry: Arc<TypeRegistry>,
    store: S,
    publisher: P,
    filters: FilterEngine<MemoryQuery>,
    pipeline: DecorationPipeline,
    clock: Arc<dyn Clock>,
}

impl<S, P> core::fmt::Debug for ItemService<S, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ItemService")
            .field("registry", &self.registry)
            .field("filters", &self.filters)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Condition label used in update events; `None` when unset.
fn condition_of(attributes: &Attributes) -> Option<String> {
    attributes.scalar("condition")
}

fn with_payload(pairs: Value) -> Attributes {
    match pairs {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

impl<S: ItemStore, P: EventPublisher> ItemService<S, P> {
    pub fn new(
        registry: Arc<TypeRegistry>,
        store: S,
        publisher: P,
        filters: FilterEngine<MemoryQuery>,
        pipeline: DecorationPipeline,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            store,
            publisher,
            filters,
            pipeline,
            clock,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Prototype engine cloned for every search.
    pub fn filters(&self) -> &FilterEngine<MemoryQuery> {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterEngine<MemoryQuery> {
        &mut self.filters
    }

    pub fn pipeline(&self) -> &DecorationPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut DecorationPipeline {
        &mut self.pipeline
    }

    fn load(&self, id: u64) -> EngineResult<StoredItem> {
        self.store.get(id).ok_or(EngineError::ItemNotFound(id))
    }

    fn save(&self, mut item: StoredItem) -> EngineResult<StoredItem> {
        item.updated_at = self.clock.now();
        if self.store.update(item.clone()) {
            Ok(item)
        } else {
            Err(EngineError::ItemNotFound(item.id))
        }
    }

    fn publish(&self, name: &str, payload: Value) -> EngineResult<()> {
        self.publisher
            .publish(DomainEvent::new(name, with_payload(payload)))
            .map(|_| ())
    }

    /// Resolves, validates and processes `attributes` for `category`.
    fn prepare(&self, category: &str, attributes: &Attributes) -> EngineResult<(String, Attributes)> {
        let descriptor = self.registry.resolve(category, attributes);
        let item_type = descriptor.item_type().to_string();
        if !descriptor.validate_data(attributes) {
            tracing::warn!(category, item_type = %item_type, "item data rejected by descriptor");
            return Err(EngineError::InvalidItemData { item_type });
        }
        Ok((item_type, descriptor.process_data(attributes)))
    }

    /// Creates an item and publishes `item.created`.
    ///
    /// The item stays stored when a strict-mode bus reports a handler failure;
    /// the failure is still returned.
    pub fn create_item(&self, user_id: u64, category: &str, attributes: Attributes) -> EngineResult<StoredItem> {
        let (item_type, processed) = self.prepare(category, &attributes)?;
        let stored = self.store.insert(NewItem {
            user_id,
            category: category.to_string(),
            item_type: item_type.clone(),
            attributes: processed,
            created_at: self.clock.now(),
        });
        tracing::info!(item_id = stored.id, user_id, category, item_type = %item_type, "item created");

        self.publish(
            names::ITEM_CREATED,
            json!({
                "item_id": stored.id,
                "user_id": user_id,
                "category": category,
                "item_type": item_type,
            }),
        )?;
        Ok(stored)
    }

    /// Merges `changes` into the item and reprocesses it.
    ///
    /// A string `category` in `changes` moves the item to that category.
    pub fn update_item(&self, id: u64, mut changes: Attributes) -> EngineResult<StoredItem> {
        let current = self.load(id)?;
        let category = match changes.remove("category") {
            Some(Value::String(category)) => category,
            _ => current.category.clone(),
        };

        let mut merged = current.attributes.clone();
        merged.extend(changes);
        let (item_type, processed) = self.prepare(&category, &merged)?;

        let old_condition = condition_of(&current.attributes);
        let new_condition = condition_of(&processed);
        let updated = self.save(StoredItem {
            category: category.clone(),
            item_type,
            attributes: processed,
            ..current.clone()
        })?;

        let mut payload = with_payload(json!({
            "item_id": id,
            "user_id": updated.user_id,
            "old_category": current.category,
            "new_category": category,
        }));
        if let Some(old) = old_condition {
            payload.insert("old_condition".into(), Value::String(old));
        }
        if let Some(new) = new_condition {
            payload.insert("new_condition".into(), Value::String(new));
        }
        self.publish(names::ITEM_UPDATED, Value::Object(payload))?;
        Ok(updated)
    }

    pub fn delete_item(&self, id: u64) -> EngineResult<StoredItem> {
        let removed = self.store.remove(id).ok_or(EngineError::ItemNotFound(id))?;
        tracing::info!(item_id = id, user_id = removed.user_id, "item deleted");
        self.publish(
            names::ITEM_DELETED,
            json!({"item_id": id, "user_id": removed.user_id, "category": removed.category}),
        )?;
        Ok(removed)
    }

    /// Sets or clears the favorite flag. Publishes only when the flag changes.
    pub fn set_favorite(&self, id: u64, favorite: bool) -> EngineResult<StoredItem> {
        let mut item = self.load(id)?;
        let was_favorite = item.attributes.is_present("is_favorite");
        if was_favorite == favorite {
            return Ok(item);
        }

        item.attributes.insert("is_favorite".into(), Value::Bool(favorite));
        if favorite {
            item.attributes
                .insert("favorited_at".into(), Value::String(self.clock.now().to_rfc3339()));
        } else {
            item.attributes.remove("favorited_at");
        }
        let item = self.save(item)?;

        let event = if favorite {
            names::ITEM_FAVORITED
        } else {
            names::ITEM_UNFAVORITED
        };
        self.publish(
            event,
            json!({"item_id": id, "user_id": item.user_id, "category": item.category}),
        )?;
        Ok(item)
    }

    /// Records one wear: bumps `usage_count` and stamps `last_worn`
    /// (and `first_worn` the first time).
    pub fn record_usage(&self, id: u64) -> EngineResult<StoredItem> {
        let mut item = self.load(id)?;
        let today = self.clock.now().date_naive().format("%Y-%m-%d").to_string();
        let uses = item.attributes.integer("usage_count").unwrap_or(0).max(0).saturating_add(1);

        item.attributes.insert("usage_count".into(), json!(uses));
        item.attributes.insert("last_worn".into(), Value::String(today.clone()));
        if !item.attributes.is_present("first_worn") {
            item.attributes.insert("first_worn".into(), Value::String(today));
        }
        let item = self.save(item)?;

        tracing::debug!(item_id = id, usage_count = uses, "item usage recorded");
        self.publish(
            names::ITEM_WORN,
            json!({"item_id": id, "user_id": item.user_id, "category": item.category}),
        )?;
        Ok(item)
    }

    /// Marks the item sold at `price`.
    pub fn mark_sold(&self, id: u64, price: f64) -> EngineResult<StoredItem> {
        let mut item = self.load(id)?;
        item.attributes.insert("is_sold".into(), Value::Bool(true));
        item.attributes.insert("sale_price".into(), json!(price));
        item.attributes
            .insert("sold_at".into(), Value::String(self.clock.now().to_rfc3339()));
        let item = self.save(item)?;

        self.publish(
            names::ITEM_SOLD,
            json!({"item_id": id, "user_id": item.user_id, "sale_price": price}),
        )?;
        Ok(item)
    }

    /// Filtered and decorated listing.
    ///
    /// Invalid or unknown filters fail the whole request before any query runs.
    pub fn search(&self, request: &SearchRequest) -> EngineResult<Vec<DecorationResult>> {
        let mut engine = self.filters.clone();
        for filter in &request.filters {
            engine.add_filter(&filter.name, filter.value.clone())?;
        }

        let mut query = MemoryQuery::new();
        if let Some(user_id) = request.user_id {
            query = query.where_equals("user_id", json!(user_id));
        }
        let query = engine.apply_filters(query)?;

        let records: Vec<Attributes> = self.store.list().iter().map(StoredItem::record).collect();
        let hits: Vec<Attributes> = query.execute(&records).into_iter().cloned().collect();
        tracing::debug!(
            total = records.len(),
            matched = hits.len(),
            filters = request.filters.len(),
            "search executed"
        );

        let names: Option<Vec<&str>> = request
            .enrichers
            .as_ref()
            .map(|names| names.iter().map(String::as_str).collect());
        self.pipeline.decorate_items(&hits, names.as_deref())
    }

    /// Decorated detail view of one item.
    pub fn show(&self, id: u64, enrichers: Option<&[&str]>) -> EngineResult<DecorationResult> {
        let item = self.load(id)?;
        self.pipeline.decorate(&item.record(), enrichers)
    }
}

/// In-process wiring: memory store, memory bus and the built-in observers.
#[derive(Debug)]
pub struct InMemoryServices {
    pub items: ItemService<Arc<InMemoryItemStore>, Arc<InMemoryEventBus>>,
    pub store: Arc<InMemoryItemStore>,
    pub bus: Arc<InMemoryEventBus>,
    pub item_observer: Arc<ItemObserver>,
    pub budget_observer: Arc<BudgetObserver>,
}

/// Builds the engine over in-memory infrastructure.
pub fn build_in_memory_services(
    options: &EngineOptions,
    clock: Arc<dyn Clock>,
    promotions: Vec<Promotion>,
) -> InMemoryServices {
    let store = Arc::new(InMemoryItemStore::new());
    let bus = Arc::new(InMemoryEventBus::with_clock(options.bus_options(), clock.clone()));

    let item_observer = Arc::new(ItemObserver::new());
    let budget_observer = Arc::new(BudgetObserver::new());
    bus.subscribe(item_observer.clone());
    bus.subscribe(budget_observer.clone());

    let mut filters = FilterEngine::with_clock(options.filter_options(), clock.clone());
    filters.register_defaults();

    let mut pipeline = DecorationPipeline::with_defaults(clock.clone(), promotions);
    pipeline.configure(options.decoration_options());

    tracing::info!(
        strategies = filters.registered_strategies().len(),
        enrichers = pipeline.registered().len(),
        max_history = options.max_history,
        "in-memory item services built"
    );

    let items = ItemService::new(
        Arc::new(TypeRegistry::with_defaults()),
        store.clone(),
        bus.clone(),
        filters,
        pipeline,
        clock,
    );

    InMemoryServices {
        items,
        store,
        bus,
        item_observer,
        budget_observer,
    }
}

/// [`build_in_memory_services`] with options from the environment and the
/// system clock.
pub fn build_from_env(promotions: Vec<Promotion>) -> InMemoryServices {
    build_in_memory_services(&EngineOptions::from_env(), Arc::new(SystemClock), promotions)
}
