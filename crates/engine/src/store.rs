//! Item persistence seam.
//!
//! The engine only needs keyed access and a full listing to run in-memory
//! queries against. [`InMemoryItemStore`] backs tests and embedding
//! applications without a database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use closet_core::Attributes;

/// A persisted item: the processed attributes plus ownership and typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: u64,
    pub user_id: u64,
    /// Category as the caller named it.
    pub category: String,
    /// Type tag of the descriptor the category resolved to.
    pub item_type: String,
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredItem {
    /// Flat record used for filtering and decoration.
    ///
    /// Ownership and typing fields win over attributes with the same key.
    pub fn record(&self) -> Attributes {
        let mut record = self.attributes.clone();
        record.insert("id".into(), json!(self.id));
        record.insert("user_id".into(), json!(self.user_id));
        record.insert("category_name".into(), Value::String(self.category.clone()));
        record.insert("item_type".into(), Value::String(self.item_type.clone()));
        record
    }
}

/// Item fields before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub user_id: u64,
    pub category: String,
    pub item_type: String,
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
}

pub trait ItemStore: Send + Sync {
    /// Persists `item` under a fresh id.
    fn insert(&self, item: NewItem) -> StoredItem;

    fn get(&self, id: u64) -> Option<StoredItem>;

    /// Replaces a stored item. Returns false when the id is unknown.
    fn update(&self, item: StoredItem) -> bool;

    fn remove(&self, id: u64) -> Option<StoredItem>;

    /// Every item, by ascending id.
    fn list(&self) -> Vec<StoredItem>;
}

impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    fn insert(&self, item: NewItem) -> StoredItem {
        (**self).insert(item)
    }

    fn get(&self, id: u64) -> Option<StoredItem> {
        (**self).get(id)
    }

    fn update(&self, item: StoredItem) -> bool {
        (**self).update(item)
    }

    fn remove(&self, id: u64) -> Option<StoredItem> {
        (**self).remove(id)
    }

    fn list(&self) -> Vec<StoredItem> {
        (**self).list()
    }
}

#[derive(Debug)]
pub struct InMemoryItemStore {
    items: RwLock<BTreeMap<u64, StoredItem>>,
    next_id: AtomicU64,
}

impl Default for InMemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemStore for InMemoryItemStore {
    fn insert(&self, item: NewItem) -> StoredItem {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = StoredItem {
            id,
            user_id: item.user_id,
            category: item.category,
            item_type: item.item_type,
            attributes: item.attributes,
            created_at: item.created_at,
            updated_at: item.created_at,
        };
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, stored.clone());
        stored
    }

    fn get(&self, id: u64) -> Option<StoredItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn update(&self, item: StoredItem) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: u64) -> Option<StoredItem> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    fn list(&self) -> Vec<StoredItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
