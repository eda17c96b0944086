//! Category → descriptor registry.
//!
//! The registry owns an append-only table from normalized category names to
//! descriptor constructors. Lookups resolve a category for one call and build a
//! fresh descriptor from the caller's attributes; unmapped categories fall back
//! to the default constructor (the accessory descriptor for
//! [`TypeRegistry::with_defaults`]).
//!
//! ## Registration
//!
//! [`TypeRegistry::register`] probes the constructor with empty attributes and
//! rejects it with [`EngineError::InvalidDescriptor`] unless the probe has a
//! non-empty type tag, validation rules, care instructions, recommended seasons
//! and a positive durability for a new item.
//!
//! ## Concurrency
//!
//! The table sits behind an `RwLock`. Lookups copy the constructor out under the
//! read lock and call it after the lock is released.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use closet_core::{Attributes, EngineError, EngineResult};

use crate::descriptor::{ItemTypeDescriptor, TypeInfo};
use crate::normalize::normalize_category;
use crate::types::{BUILTIN_CATEGORIES, BUILTIN_TYPES, builtin_constructor, fallback_constructor};

/// Builds a descriptor from raw attributes.
pub type DescriptorConstructor =
    Arc<dyn Fn(&Attributes) -> Box<dyn ItemTypeDescriptor> + Send + Sync>;

#[derive(Clone)]
struct Registration {
    item_type: String,
    constructor: DescriptorConstructor,
}

impl Registration {
    fn build(&self, data: &Attributes) -> Box<dyn ItemTypeDescriptor> {
        (self.constructor)(data)
    }
}

/// Category-driven descriptor registry.
pub struct TypeRegistry {
    table: RwLock<HashMap<String, Registration>>,
    fallback: Registration,
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("categories", &self.read().len())
            .field("fallback", &self.fallback.item_type)
            .finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn probe(category: &str, constructor: &DescriptorConstructor) -> EngineResult<Registration> {
    let descriptor = constructor(&Attributes::new());
    let item_type = descriptor.item_type().trim().to_string();

    let missing = if item_type.is_empty() {
        Some("type tag is empty")
    } else if descriptor.validation_rules().is_empty() {
        Some("no validation rules")
    } else if descriptor.care_instructions().is_empty() {
        Some("no care instructions")
    } else if descriptor.recommended_seasons().is_empty() {
        Some("no recommended seasons")
    } else if descriptor.calculate_durability("novo") == 0 {
        Some("durability for a new item is not positive")
    } else {
        None
    };

    match missing {
        Some(reason) => Err(EngineError::invalid_descriptor(category, reason)),
        None => Ok(Registration {
            item_type,
            constructor: constructor.clone(),
        }),
    }
}

impl TypeRegistry {
    /// Registry with only a fallback constructor.
    pub fn empty(fallback: DescriptorConstructor) -> EngineResult<Self> {
        let fallback = probe("<fallback>", &fallback)?;
        Ok(Self {
            table: RwLock::new(HashMap::new()),
            fallback,
        })
    }

    /// Registry pre-populated with the built-in category table, falling back to
    /// the accessory descriptor.
    pub fn with_defaults() -> Self {
        let mut table = HashMap::new();
        for (category, item_type) in BUILTIN_CATEGORIES {
            if let Some(constructor) = builtin_constructor(item_type) {
                table.insert(
                    category.to_string(),
                    Registration {
                        item_type: item_type.to_string(),
                        constructor,
                    },
                );
            }
        }

        let fallback = Registration {
            item_type: "accessory".to_string(),
            constructor: fallback_constructor(),
        };

        Self {
            table: RwLock::new(table),
            fallback,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Registration>> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, normalized: &str) -> Option<Registration> {
        self.read().get(normalized).cloned()
    }

    /// Builds the descriptor for `category` from `data`.
    ///
    /// Unmapped categories resolve to the fallback descriptor; this is logged,
    /// never an error.
    pub fn resolve(&self, category: &str, data: &Attributes) -> Box<dyn ItemTypeDescriptor> {
        let normalized = normalize_category(category);
        let registration = match self.lookup(&normalized) {
            Some(registration) => registration,
            None => {
                tracing::warn!(
                    category,
                    normalized = %normalized,
                    fallback = %self.fallback.item_type,
                    "category not mapped, using fallback descriptor"
                );
                self.fallback.clone()
            }
        };

        tracing::debug!(category, item_type = %registration.item_type, "resolved item type");
        registration.build(data)
    }

    /// Adds or replaces the mapping for `category`.
    pub fn register(&self, category: &str, constructor: DescriptorConstructor) -> EngineResult<()> {
        let normalized = normalize_category(category);
        if normalized.is_empty() {
            return Err(EngineError::invalid_descriptor(
                category,
                "category name is empty after normalization",
            ));
        }

        let registration = probe(category, &constructor)?;
        let item_type = registration.item_type.clone();

        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.insert(normalized.clone(), registration);

        tracing::info!(category, normalized = %normalized, item_type = %item_type, "item type registered");
        Ok(())
    }

    /// Builds a built-in descriptor by type tag.
    pub fn create_by_type(&self, item_type: &str, data: &Attributes) -> EngineResult<Box<dyn ItemTypeDescriptor>> {
        let constructor = builtin_constructor(item_type)
            .ok_or_else(|| EngineError::UnknownItemType(item_type.to_string()))?;
        tracing::debug!(item_type, "creating item type by tag");
        Ok(constructor(data))
    }

    /// Built-in type tags and their display labels.
    pub fn available_types(&self) -> Vec<(&'static str, &'static str)> {
        BUILTIN_TYPES.to_vec()
    }

    /// Sorted normalized categories that resolve to `item_type`.
    pub fn categories_for_type(&self, item_type: &str) -> Vec<String> {
        let mut categories: Vec<String> = self
            .read()
            .iter()
            .filter(|(_, r)| r.item_type == item_type)
            .map(|(category, _)| category.clone())
            .collect();
        categories.sort();
        categories
    }

    pub fn is_category_supported(&self, category: &str) -> bool {
        self.read().contains_key(&normalize_category(category))
    }

    /// Introspection view of the (possibly fallback) descriptor for `category`.
    pub fn type_info(&self, category: &str) -> TypeInfo {
        let registration = self
            .lookup(&normalize_category(category))
            .unwrap_or_else(|| self.fallback.clone());
        TypeInfo::of(registration.build(&Attributes::new()).as_ref())
    }

    /// Number of mapped categories per type tag.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for registration in self.read().values() {
            *counts.entry(registration.item_type.clone()).or_insert(0) += 1;
        }
        counts
    }
}
