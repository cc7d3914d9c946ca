use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemId};

// ---------------------------------------------------------------------------
// CartEntry: One selected item and how many of it
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item: Item,
    pub quantity: i64,
}

impl CartEntry {
    pub fn line_total(&self) -> f64 {
        self.item.price * self.quantity as f64
    }
}

/// Persisted cart layout: item id to entry, serialized as a JSON object
/// keyed by the id's decimal string.
pub type CartContents = BTreeMap<ItemId, CartEntry>;
