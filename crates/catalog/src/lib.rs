//! Item-type registry.
//!
//! Maps item categories (`"camiseta"`, `"tênis"`, `"colar"`) to descriptors
//! carrying the category's validation, normalization, durability, care and
//! season behaviour. Pure domain logic: no IO, no storage.

pub mod descriptor;
pub mod normalize;
pub mod registry;
pub mod types;

pub use descriptor::{Characteristics, FieldRule, ItemTypeDescriptor, RuleKind, TypeInfo};
pub use normalize::normalize_category;
pub use registry::{DescriptorConstructor, TypeRegistry};
pub use types::{AccessoryItem, BagItem, ClothingItem, JewelryItem, ShoeItem};
