//! `closet-engine`: the item engine assembled.
//!
//! Loads [`EngineOptions`], keeps items in an [`ItemStore`] and drives the
//! type registry, event bus, filter engine and decoration pipeline from one
//! [`ItemService`].

pub mod config;
pub mod service;
pub mod store;

pub use config::{ENV_PREFIX, EngineOptions};
pub use service::{InMemoryServices, ItemService, SearchRequest, build_from_env, build_in_memory_services};
pub use store::{InMemoryItemStore, ItemStore, NewItem, StoredItem};
