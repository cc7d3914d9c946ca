use serde::{Deserialize, Serialize};

/// Identifier of a catalog item.
pub type ItemId = u64;

// ---------------------------------------------------------------------------
// Item: A purchasable catalog entry as returned by the items endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub game: String,
    #[serde(rename = "type", default)]
    pub type_field: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub featured: bool,
}

impl Item {
    /// Whether the item is currently discounted against its previous price.
    pub fn is_on_sale(&self) -> bool {
        self.old_price.is_some_and(|old| old > self.price)
    }
}
