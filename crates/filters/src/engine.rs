//! Predicate filter engine.
//!
//! Holds a named set of [`FilterStrategy`] implementations and a caller-built
//! active filter set (name to value). Applying the engine folds every active
//! filter onto a host [`Query`] in the order the filters were added.
//!
//! ## Failure policy
//!
//! Bad input is rejected early: `add_filter` and `apply_single_filter` fail
//! with [`EngineError::UnknownFilter`] or [`EngineError::InvalidFilterValue`]
//! and leave the active set untouched. A strategy that fails while being
//! applied is logged and skipped, and the query falls back to its state before
//! that strategy. With `skip_invalid: false` the failure is returned instead.
//!
//! The engine is `Clone`: build one at start-up, clone it per query.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use closet_core::{Clock, EngineError, EngineResult, SystemClock};

use crate::query::Query;
use crate::strategies::{CategoryFilter, ColorFilter, ConditionFilter, SeasonFilter};
use crate::strategy::{FilterStrategy, StrategyInfo};

/// Filter engine switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterOptions {
    /// Log registrations and apply summaries at `info`, filter changes at `debug`.
    pub log_filters: bool,
    /// Run each strategy's validator before accepting a value.
    pub validate_values: bool,
    /// Skip strategies that fail during `apply_filters` instead of returning the error.
    pub skip_invalid: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            log_filters: true,
            validate_values: true,
            skip_invalid: true,
        }
    }
}

/// One entry of the active filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub name: String,
    pub value: Value,
}

/// Portable copy of an active filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSnapshot {
    pub active_filters: Vec<ActiveFilter>,
    pub timestamp: DateTime<Utc>,
    pub strategies_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub registered_strategies: usize,
    pub active_filters: usize,
    pub strategy_names: Vec<String>,
    pub active_filter_names: Vec<String>,
    pub options: FilterOptions,
}

pub struct FilterEngine<Q: Query> {
    strategies: Vec<Arc<dyn FilterStrategy<Q>>>,
    active: Vec<ActiveFilter>,
    options: FilterOptions,
    clock: Arc<dyn Clock>,
}

impl<Q: Query> Clone for FilterEngine<Q> {
    fn clone(&self) -> Self {
        Self {
            strategies: self.strategies.clone(),
            active: self.active.clone(),
            options: self.options,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<Q: Query> core::fmt::Debug for FilterEngine<Q> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("strategies", &self.strategy_names())
            .field("active", &self.active)
            .field("options", &self.options)
            .finish()
    }
}

impl<Q: Query> Default for FilterEngine<Q> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<Q: Query> FilterEngine<Q> {
    /// Engine with no strategies.
    pub fn new() -> Self {
        Self::with_options(FilterOptions::default())
    }

    pub fn with_options(options: FilterOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Engine stamping exported snapshots with `clock`.
    pub fn with_clock(options: FilterOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            strategies: Vec::new(),
            active: Vec::new(),
            options,
            clock,
        }
    }

    /// Engine with the `category`, `color`, `condition` and `season` strategies.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.register_defaults();
        engine
    }

    pub fn register_defaults(&mut self) {
        self.register_strategy(Arc::new(CategoryFilter));
        self.register_strategy(Arc::new(ColorFilter));
        self.register_strategy(Arc::new(ConditionFilter));
        self.register_strategy(Arc::new(SeasonFilter));
    }

    fn strategy(&self, name: &str) -> Option<&Arc<dyn FilterStrategy<Q>>> {
        self.strategies.iter().find(|s| s.name() == name)
    }

    fn strategy_names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// Adds `strategy`. A strategy with the same name is replaced in place.
    pub fn register_strategy(&mut self, strategy: Arc<dyn FilterStrategy<Q>>) {
        if self.options.log_filters {
            tracing::info!(
                strategy = strategy.name(),
                description = strategy.description(),
                "filter strategy registered"
            );
        }
        match self.strategies.iter_mut().find(|s| s.name() == strategy.name()) {
            Some(slot) => *slot = strategy,
            None => self.strategies.push(strategy),
        }
    }

    /// Removes the strategy and drops it from the active set.
    pub fn unregister_strategy(&mut self, name: &str) -> bool {
        let before = self.strategies.len();
        self.strategies.retain(|s| s.name() != name);
        let removed = self.strategies.len() < before;
        if removed {
            self.active.retain(|f| f.name != name);
            if self.options.log_filters {
                tracing::info!(strategy = name, "filter strategy removed");
            }
        }
        removed
    }

    fn validated(&self, name: &str, value: &Value) -> EngineResult<&Arc<dyn FilterStrategy<Q>>> {
        let strategy = self
            .strategy(name)
            .ok_or_else(|| EngineError::UnknownFilter(name.to_string()))?;
        if self.options.validate_values && !strategy.is_valid_value(value) {
            return Err(EngineError::invalid_filter_value(name, value));
        }
        Ok(strategy)
    }

    /// Activates `name` with `value`. Re-adding a filter replaces its value and
    /// keeps its position.
    pub fn add_filter(&mut self, name: &str, value: Value) -> EngineResult<&mut Self> {
        self.validated(name, &value)?;

        if self.options.log_filters {
            tracing::debug!(strategy = name, value = %value, "filter added");
        }
        match self.active.iter_mut().find(|f| f.name == name) {
            Some(entry) => entry.value = value,
            None => self.active.push(ActiveFilter {
                name: name.to_string(),
                value,
            }),
        }
        Ok(self)
    }

    pub fn remove_filter(&mut self, name: &str) -> &mut Self {
        let before = self.active.len();
        self.active.retain(|f| f.name != name);
        if self.active.len() < before && self.options.log_filters {
            tracing::debug!(strategy = name, "filter removed");
        }
        self
    }

    pub fn clear_filters(&mut self) -> &mut Self {
        let count = self.active.len();
        self.active.clear();
        if self.options.log_filters {
            tracing::debug!(count, "all filters removed");
        }
        self
    }

    pub fn has_active_filter(&self, name: &str) -> bool {
        self.active.iter().any(|f| f.name == name)
    }

    pub fn filter_value(&self, name: &str) -> Option<&Value> {
        self.active.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn active_filters(&self) -> &[ActiveFilter] {
        &self.active
    }

    /// Folds every active filter onto `query`, in insertion order.
    pub fn apply_filters(&self, query: Q) -> EngineResult<Q> {
        if self.active.is_empty() {
            return Ok(query);
        }

        let started = Instant::now();
        let mut query = query;
        let mut applied = 0usize;

        for filter in &self.active {
            let Some(strategy) = self.strategy(&filter.name) else {
                continue;
            };
            match strategy.apply(query.clone(), &filter.value) {
                Ok(next) => {
                    query = next;
                    applied += 1;
                }
                Err(err) => {
                    tracing::error!(
                        strategy = %filter.name,
                        value = %filter.value,
                        error = %err,
                        "filter application failed"
                    );
                    if !self.options.skip_invalid {
                        return Err(EngineError::FilterApplicationFailure {
                            filter: filter.name.clone(),
                            reason: format!("{err:#}"),
                        });
                    }
                }
            }
        }

        if self.options.log_filters {
            tracing::info!(
                applied_count = applied,
                total_active = self.active.len(),
                execution_time_ms = started.elapsed().as_secs_f64() * 1000.0,
                "filters applied"
            );
        }
        Ok(query)
    }

    /// Applies one filter outside the active set, with the same validation as
    /// [`add_filter`](Self::add_filter).
    pub fn apply_single_filter(&self, query: Q, name: &str, value: &Value) -> EngineResult<Q> {
        let strategy = self.validated(name, value)?;
        strategy
            .apply(query, value)
            .map_err(|err| EngineError::FilterApplicationFailure {
                filter: name.to_string(),
                reason: format!("{err:#}"),
            })
    }

    pub fn registered_strategies(&self) -> Vec<StrategyInfo> {
        self.strategies.iter().map(|s| StrategyInfo::of(s.as_ref())).collect()
    }

    pub fn stats(&self) -> FilterStats {
        FilterStats {
            registered_strategies: self.strategies.len(),
            active_filters: self.active.len(),
            strategy_names: self.strategy_names(),
            active_filter_names: self.active.iter().map(|f| f.name.clone()).collect(),
            options: self.options,
        }
    }

    pub fn export_filters(&self) -> FilterSnapshot {
        FilterSnapshot {
            active_filters: self.active.clone(),
            timestamp: self.clock.now(),
            strategies_count: self.strategies.len(),
        }
    }

    /// Replaces the active set with the snapshot's filters. Entries that fail
    /// validation are skipped with a warning.
    pub fn import_filters(&mut self, snapshot: &FilterSnapshot) -> &mut Self {
        self.active.clear();
        for filter in &snapshot.active_filters {
            if let Err(err) = self.add_filter(&filter.name, filter.value.clone()) {
                tracing::warn!(strategy = %filter.name, error = %err, "filter import skipped");
            }
        }
        self
    }

    pub fn options(&self) -> FilterOptions {
        self.options
    }

    pub fn configure(&mut self, options: FilterOptions) {
        self.options = options;
        if options.log_filters {
            tracing::info!(?options, "filter engine configured");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{MemoryQuery, Predicate};
    use chrono::TimeZone;
    use closet_core::FixedClock;
    use proptest::prelude::*;
    use serde_json::json;

    struct Broken;

    impl FilterStrategy<MemoryQuery> for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn is_valid_value(&self, _value: &Value) -> bool {
            true
        }

        fn apply(&self, query: MemoryQuery, _value: &Value) -> anyhow::Result<MemoryQuery> {
            let _half_built = query.where_equals("never", json!(true));
            anyhow::bail!("backend rejected predicate")
        }
    }

    fn engine() -> FilterEngine<MemoryQuery> {
        FilterEngine::with_defaults()
    }

    #[test]
    fn defaults_register_four_strategies_in_order() {
        let names: Vec<_> = engine().registered_strategies().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["category", "color", "condition", "season"]);
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let mut e = engine();
        match e.add_filter("brand", json!("acme")) {
            Err(EngineError::UnknownFilter(name)) => assert_eq!(name, "brand"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_value_leaves_active_set_unchanged() {
        let mut e = engine();
        e.add_filter("color", json!("azul")).unwrap();
        let before = e.active_filters().to_vec();

        match e.add_filter("condition", json!("quebrado")) {
            Err(EngineError::InvalidFilterValue { filter, value }) => {
                assert_eq!(filter, "condition");
                assert_eq!(value, "\"quebrado\"");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(e.active_filters(), before.as_slice());
    }

    #[test]
    fn validation_can_be_disabled() {
        let mut e = FilterEngine::<MemoryQuery>::with_options(FilterOptions {
            validate_values: false,
            ..FilterOptions::default()
        });
        e.register_defaults();
        e.add_filter("condition", json!("quebrado")).unwrap();
        assert!(e.has_active_filter("condition"));
    }

    #[test]
    fn add_filter_is_chainable_and_keeps_order() {
        let mut e = engine();
        e.add_filter("season", json!("verao"))
            .unwrap()
            .add_filter("category", json!(3))
            .unwrap()
            .add_filter("season", json!("inverno"))
            .unwrap();

        let names: Vec<_> = e.active_filters().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["season", "category"]);
        assert_eq!(e.filter_value("season"), Some(&json!("inverno")));
    }

    #[test]
    fn apply_filters_composes_in_insertion_order() {
        let mut e = engine();
        e.add_filter("condition", json!(["novo", "usado_bom"]))
            .unwrap()
            .add_filter("color", json!("azul"))
            .unwrap();

        let query = e.apply_filters(MemoryQuery::new()).unwrap();
        assert_eq!(
            query.predicates(),
            &[
                Predicate::In {
                    field: "condition".into(),
                    values: vec![json!("novo"), json!("usado_bom")],
                },
                Predicate::JsonContains {
                    field: "colors".into(),
                    value: json!("azul"),
                },
            ]
        );
    }

    #[test]
    fn empty_active_set_returns_query_unmodified() {
        let base = MemoryQuery::new().where_equals("user_id", json!(1));
        assert_eq!(engine().apply_filters(base.clone()).unwrap(), base);
    }

    #[test]
    fn failing_strategy_is_skipped_and_reverted() {
        let mut e = engine();
        e.register_strategy(Arc::new(Broken));
        e.add_filter("broken", json!(1))
            .unwrap()
            .add_filter("season", json!("verao"))
            .unwrap();

        let query = e.apply_filters(MemoryQuery::new()).unwrap();
        assert_eq!(query.predicates().len(), 1);
        assert_eq!(query.predicates()[0].field(), "season");
    }

    #[test]
    fn failing_strategy_surfaces_when_not_skipping() {
        let mut e = engine();
        e.configure(FilterOptions {
            skip_invalid: false,
            ..FilterOptions::default()
        });
        e.register_strategy(Arc::new(Broken));
        e.add_filter("broken", json!(1)).unwrap();

        match e.apply_filters(MemoryQuery::new()) {
            Err(EngineError::FilterApplicationFailure { filter, reason }) => {
                assert_eq!(filter, "broken");
                assert!(reason.contains("backend rejected"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn single_filter_validates_and_bypasses_active_set() {
        let e = engine();
        let query = e
            .apply_single_filter(MemoryQuery::new(), "category", &json!("7"))
            .unwrap();
        assert_eq!(query.predicates().len(), 1);
        assert!(e.active_filters().is_empty());

        assert!(matches!(
            e.apply_single_filter(MemoryQuery::new(), "category", &json!(0)),
            Err(EngineError::InvalidFilterValue { .. })
        ));
        assert!(matches!(
            e.apply_single_filter(MemoryQuery::new(), "size", &json!(40)),
            Err(EngineError::UnknownFilter(_))
        ));
    }

    #[test]
    fn reregistering_replaces_in_place_and_unregister_drops_active() {
        let mut e = engine();
        e.register_strategy(Arc::new(ColorFilter));
        assert_eq!(e.stats().strategy_names, ["category", "color", "condition", "season"]);

        e.add_filter("color", json!("preto")).unwrap();
        assert!(e.unregister_strategy("color"));
        assert!(!e.has_active_filter("color"));
        assert!(!e.unregister_strategy("color"));
        assert_eq!(e.stats().registered_strategies, 3);
    }

    #[test]
    fn remove_and_clear() {
        let mut e = engine();
        e.add_filter("color", json!("preto"))
            .unwrap()
            .add_filter("season", json!("todas"))
            .unwrap();
        e.remove_filter("color");
        assert_eq!(e.stats().active_filter_names, ["season"]);
        e.clear_filters();
        assert!(e.active_filters().is_empty());
    }

    #[test]
    fn clones_are_independent() {
        let mut prototype = engine();
        prototype.add_filter("season", json!("verao")).unwrap();

        let mut per_query = prototype.clone();
        per_query.add_filter("color", json!("azul")).unwrap();

        assert_eq!(prototype.active_filters().len(), 1);
        assert_eq!(per_query.active_filters().len(), 2);
    }

    #[test]
    fn export_then_import_skips_invalid_entries() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut e = FilterEngine::<MemoryQuery>::with_clock(
            FilterOptions::default(),
            Arc::new(FixedClock::new(at)),
        );
        e.register_defaults();
        e.add_filter("color", json!(["azul", "rosa"])).unwrap();

        let mut snapshot = e.export_filters();
        assert_eq!(snapshot.timestamp, at);
        assert_eq!(snapshot.strategies_count, 4);

        snapshot.active_filters.push(ActiveFilter {
            name: "season".into(),
            value: json!("monção"),
        });
        snapshot.active_filters.push(ActiveFilter {
            name: "condition".into(),
            value: json!("novo"),
        });

        let mut other = engine();
        other.add_filter("category", json!(1)).unwrap();
        other.import_filters(&snapshot);

        let names: Vec<_> = other.active_filters().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["color", "condition"]);
    }

    #[test]
    fn options_deserialize_with_defaults_and_reject_unknown_keys() {
        let opts: FilterOptions = serde_json::from_value(json!({"validate_values": false})).unwrap();
        assert!(!opts.validate_values);
        assert!(opts.log_filters);
        assert!(serde_json::from_value::<FilterOptions>(json!({"cache_results": true})).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

        #[test]
        fn rejected_values_never_change_active_set(label in "[a-z_]{1,12}") {
            prop_assume!(!closet_core::ItemCondition::ALL.iter().any(|c| c.as_str() == label));
            let mut e = engine();
            e.add_filter("season", json!("verao")).unwrap();
            let before = e.active_filters().to_vec();
            let rejected = e.add_filter("condition", json!(label)).is_err();
            prop_assert!(rejected);
            prop_assert_eq!(e.active_filters(), before.as_slice());
        }
    }
}
