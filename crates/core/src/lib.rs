//! `closet-core`: shared building blocks for the item engine.
//!
//! Pure primitives only: attribute maps, the error taxonomy, the injectable
//! clock and the condition/season value objects.

pub mod attributes;
pub mod clock;
pub mod error;
pub mod value_object;

pub use attributes::{Attributes, AttributesExt};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{EngineError, EngineResult};
pub use value_object::{ItemCondition, Season};
