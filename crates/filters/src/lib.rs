//! Predicate filter engine.
//!
//! Callers assemble an active filter set by name and let the engine compose
//! it onto a host [`Query`] builder.

pub mod engine;
pub mod query;
pub mod strategies;
pub mod strategy;

pub use engine::{ActiveFilter, FilterEngine, FilterOptions, FilterSnapshot, FilterStats};
pub use query::{MemoryQuery, Predicate, Query};
pub use strategies::{COLORS, CategoryFilter, ColorFilter, ConditionFilter, SeasonFilter};
pub use strategy::{FilterStrategy, StrategyInfo};
