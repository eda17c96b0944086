//! Built-in item-type descriptors and the category table that maps onto them.

mod accessory;
mod bag;
mod clothing;
mod jewelry;
mod shoe;

use std::sync::Arc;

use closet_core::Attributes;

pub use accessory::{AccessoryItem, versatility_score};
pub use bag::BagItem;
pub use clothing::ClothingItem;
pub use jewelry::JewelryItem;
pub use shoe::{ShoeItem, comfort_level};

use crate::descriptor::ItemTypeDescriptor;
use crate::registry::DescriptorConstructor;

/// Built-in type tags with their display labels, in listing order.
pub const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("clothing", "Roupas"),
    ("accessory", "Acessórios"),
    ("shoe", "Calçados"),
    ("bag", "Bolsas"),
    ("jewelry", "Joias"),
];

/// Normalized category names and the built-in type each maps to.
pub const BUILTIN_CATEGORIES: &[(&str, &str)] = &[
    ("camiseta", "clothing"),
    ("camisa", "clothing"),
    ("blusa", "clothing"),
    ("vestido", "clothing"),
    ("saia", "clothing"),
    ("calca", "clothing"),
    ("shorts", "clothing"),
    ("jaqueta", "clothing"),
    ("casaco", "clothing"),
    ("blazer", "clothing"),
    ("sueter", "clothing"),
    ("moletom", "clothing"),
    ("lingerie", "clothing"),
    ("pijama", "clothing"),
    ("roupa_intima", "clothing"),
    ("tenis", "shoe"),
    ("sapato", "shoe"),
    ("sandalia", "shoe"),
    ("chinelo", "shoe"),
    ("bota", "shoe"),
    ("sapatilha", "shoe"),
    ("salto", "shoe"),
    ("calcado_esportivo", "shoe"),
    ("bolsa", "bag"),
    ("mochila", "bag"),
    ("carteira", "bag"),
    ("clutch", "bag"),
    ("necessaire", "bag"),
    ("mala", "bag"),
    ("cinto", "accessory"),
    ("chapeu", "accessory"),
    ("bone", "accessory"),
    ("oculos", "accessory"),
    ("lenco", "accessory"),
    ("cachecol", "accessory"),
    ("luva", "accessory"),
    ("gravata", "accessory"),
    ("suspensorio", "accessory"),
    ("colar", "jewelry"),
    ("pulseira", "jewelry"),
    ("anel", "jewelry"),
    ("brinco", "jewelry"),
    ("relogio", "jewelry"),
    ("broche", "jewelry"),
];

fn clothing(data: &Attributes) -> Box<dyn ItemTypeDescriptor> {
    Box::new(ClothingItem::new(data.clone()))
}

fn shoe(data: &Attributes) -> Box<dyn ItemTypeDescriptor> {
    Box::new(ShoeItem::new(data.clone()))
}

fn bag(_: &Attributes) -> Box<dyn ItemTypeDescriptor> {
    Box::new(BagItem)
}

fn accessory(data: &Attributes) -> Box<dyn ItemTypeDescriptor> {
    Box::new(AccessoryItem::new(data.clone()))
}

fn jewelry(data: &Attributes) -> Box<dyn ItemTypeDescriptor> {
    Box::new(JewelryItem::new(data.clone()))
}

/// Constructor for a built-in type tag.
pub fn builtin_constructor(item_type: &str) -> Option<DescriptorConstructor> {
    let ctor: DescriptorConstructor = match item_type {
        "clothing" => Arc::new(clothing),
        "shoe" => Arc::new(shoe),
        "bag" => Arc::new(bag),
        "accessory" => Arc::new(accessory),
        "jewelry" => Arc::new(jewelry),
        _ => return None,
    };
    Some(ctor)
}

/// Constructor used for categories with no mapping.
pub fn fallback_constructor() -> DescriptorConstructor {
    Arc::new(accessory)
}
