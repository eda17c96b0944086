use serde::{Deserialize, Serialize};

use closet_core::Attributes;

/// Event names published by the engine, `<entity>.<verb>`.
pub mod names {
    pub const ITEM_CREATED: &str = "item.created";
    pub const ITEM_UPDATED: &str = "item.updated";
    pub const ITEM_DELETED: &str = "item.deleted";
    pub const ITEM_FAVORITED: &str = "item.favorited";
    pub const ITEM_UNFAVORITED: &str = "item.unfavorited";
    pub const ITEM_WORN: &str = "item.worn";
    pub const ITEM_SOLD: &str = "item.sold";

    pub const BUDGET_CREATED: &str = "budget.created";
    pub const BUDGET_UPDATED: &str = "budget.updated";
    pub const BUDGET_EXCEEDED: &str = "budget.exceeded";
    pub const BUDGET_WARNING: &str = "budget.warning";
    pub const PURCHASE_MADE: &str = "purchase.made";
}

/// A named, transient domain event.
///
/// Events are facts: a dot-namespaced name (e.g. `item.created`) and a payload
/// map. Only a summary survives publication (see [`crate::EventHistory`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub name: String,
    pub payload: Attributes,
}

impl DomainEvent {
    pub fn new(name: impl Into<String>, payload: Attributes) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Event without payload.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Attributes::new())
    }

    /// Entity part of the name (`"item"` for `"item.created"`).
    pub fn entity(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_is_name_prefix() {
        assert_eq!(DomainEvent::named(names::ITEM_WORN).entity(), "item");
        assert_eq!(DomainEvent::named("heartbeat").entity(), "heartbeat");
    }
}
