use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use closet_core::Attributes;

/// Key of the enricher blocks in a decorated record.
pub const DECORATIONS_KEY: &str = "decorations";
/// Key of the run metadata in a decorated record.
pub const METADATA_KEY: &str = "decoration_metadata";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorationMetadata {
    /// Enricher names in the order they ran successfully.
    pub applied_decorators: Vec<String>,
    /// Wall-clock duration of the call, in seconds.
    pub execution_time: f64,
    pub total_decorators_available: usize,
    pub decorators_applied: usize,
    pub decorated_at: DateTime<Utc>,
}

/// Display-ready item: the stored fields, every contributed block and the run
/// metadata. Serializes to one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorationResult {
    #[serde(flatten)]
    pub fields: Attributes,
    pub decorations: Attributes,
    pub decoration_metadata: DecorationMetadata,
}

impl DecorationResult {
    /// Block contributed by `enricher`, if any.
    pub fn decoration(&self, enricher: &str) -> Option<&Attributes> {
        self.decorations.get(enricher).and_then(Value::as_object)
    }

    pub fn applied(&self) -> &[String] {
        &self.decoration_metadata.applied_decorators
    }

    pub fn into_attributes(self) -> Attributes {
        let mut record = self.fields;
        record.insert(DECORATIONS_KEY.to_string(), Value::Object(self.decorations));
        let metadata = serde_json::to_value(&self.decoration_metadata).unwrap_or(Value::Null);
        record.insert(METADATA_KEY.to_string(), metadata);
        record
    }
}
