//! Engine error model.

use thiserror::Error;

/// Result type used across the engine crates.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
///
/// Registration-time misconfiguration (`InvalidDescriptor`) and caller input
/// errors (`InvalidFilterValue`, `UnknownFilter`, ...) surface to the caller.
/// The `*Failure` variants describe faults inside a single plugin; components
/// catch and log them, and only return them when configured with
/// `skip_invalid: false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A descriptor constructor produced a type that lacks part of the
    /// descriptor capability set.
    #[error("invalid descriptor for category '{category}': {reason}")]
    InvalidDescriptor { category: String, reason: String },

    /// A type tag that no built-in descriptor answers to.
    #[error("unsupported item type: {0}")]
    UnknownItemType(String),

    /// A filter name with no registered strategy.
    #[error("filter strategy not found: {0}")]
    UnknownFilter(String),

    /// A filter value rejected by its strategy's validator.
    #[error("invalid value for filter '{filter}': {value}")]
    InvalidFilterValue { filter: String, value: String },

    /// An enricher name with no registration.
    #[error("enricher not found: {0}")]
    UnknownEnricher(String),

    /// A subscriber handler returned an error or panicked.
    #[error("subscriber '{subscriber}' failed on '{event}': {reason}")]
    HandlerFailure {
        subscriber: String,
        event: String,
        reason: String,
    },

    /// An enricher's contribution returned an error or panicked.
    #[error("enricher '{enricher}' failed: {reason}")]
    EnricherFailure { enricher: String, reason: String },

    /// A filter strategy failed while being applied to a query.
    #[error("filter '{filter}' failed to apply: {reason}")]
    FilterApplicationFailure { filter: String, reason: String },

    /// Item attributes rejected by the resolved descriptor.
    #[error("invalid item data for type '{item_type}'")]
    InvalidItemData { item_type: String },

    /// No stored item with the given id.
    #[error("item not found: {0}")]
    ItemNotFound(u64),
}

impl EngineError {
    pub fn invalid_descriptor(category: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            category: category.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_filter_value(filter: impl Into<String>, value: &serde_json::Value) -> Self {
        Self::InvalidFilterValue {
            filter: filter.into(),
            value: value.to_string(),
        }
    }

    /// True for errors a caller should translate into a client-side (4xx) response.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidDescriptor { .. }
                | Self::InvalidFilterValue { .. }
                | Self::UnknownFilter(_)
                | Self::UnknownItemType(_)
                | Self::InvalidItemData { .. }
                | Self::ItemNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_filter_value_names_filter_and_value() {
        let err = EngineError::invalid_filter_value("color", &json!("turquesa"));
        let msg = err.to_string();
        assert!(msg.contains("color"));
        assert!(msg.contains("turquesa"));
        assert!(err.is_user_facing());
    }

    #[test]
    fn plugin_failures_are_not_user_facing() {
        let err = EngineError::HandlerFailure {
            subscriber: "item_observer".to_string(),
            event: "item.created".to_string(),
            reason: "missing item_id".to_string(),
        };
        assert!(!err.is_user_facing());
        assert!(err.to_string().contains("item_observer"));
    }
}
