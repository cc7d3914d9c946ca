//! Shopping cart backed by durable storage.
//!
//! The cart is a mapping from item id to [`CartEntry`]. Entries never hold a
//! quantity below 1: reducing a quantity to zero removes the entry. Every
//! mutation writes the whole cart to storage before returning; a failed write
//! is logged and the in-memory change stands.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::catalog::CatalogStore;
use crate::config::CART_STORAGE_KEY;
use crate::error::StorefrontError;
use crate::models::{CartContents, CartEntry, Item, ItemId};
use crate::storage::CartStorage;

/// An item lookup shared by every `add_item` call waiting on the same id.
type Resolution = Shared<BoxFuture<'static, Option<Item>>>;

/// Clears a lookup from `pending` once its caller finishes or is dropped.
///
/// Only the entry this caller waited on is removed; a newer lookup for the
/// same id started in the meantime stays.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<ItemId, Resolution>>,
    id: ItemId,
    resolution: Resolution,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();
        if pending
            .get(&self.id)
            .is_some_and(|r| r.ptr_eq(&self.resolution))
        {
            pending.remove(&self.id);
        }
    }
}

#[derive(Debug, Default)]
struct CartState {
    entries: CartContents,
    loaded: bool,
}

pub struct CartStore {
    catalog: Arc<CatalogStore>,
    storage: Option<Arc<dyn CartStorage>>,
    storage_key: String,
    state: Mutex<CartState>,
    pending: Mutex<HashMap<ItemId, Resolution>>,
}

impl CartStore {
    /// Create an empty cart.
    ///
    /// With `storage` set to `None` the cart lives in memory only and
    /// [`load`](Self::load) leaves it unloaded.
    pub fn new(catalog: Arc<CatalogStore>, storage: Option<Arc<dyn CartStorage>>) -> Self {
        Self::with_storage_key(catalog, storage, CART_STORAGE_KEY)
    }

    pub fn with_storage_key(
        catalog: Arc<CatalogStore>,
        storage: Option<Arc<dyn CartStorage>>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            storage,
            storage_key: storage_key.into(),
            state: Mutex::new(CartState::default()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    // -- Hydration ---------------------------------------------------------

    /// Restore the cart from storage. Only the first call has any effect.
    ///
    /// An unreadable or corrupt document yields an empty cart; the cart is
    /// marked loaded either way. Entries with a non-positive quantity are
    /// dropped.
    pub fn load(&self) {
        let Some(storage) = &self.storage else {
            tracing::debug!("No durable storage; cart stays in memory");
            return;
        };

        let mut state = self.state.lock();
        if state.loaded {
            return;
        }

        match storage.get(&self.storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<CartContents>(&raw) {
                Ok(mut entries) => {
                    entries.retain(|_, entry| entry.quantity > 0);
                    state.entries = entries;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load cart from storage");
                    state.entries.clear();
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cart from storage");
                state.entries.clear();
            }
        }
        state.loaded = true;
        tracing::debug!(entries = state.entries.len(), "Cart hydrated");
    }

    fn persist(&self, entries: &CartContents) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = serde_json::to_string(entries)
            .map_err(StorefrontError::from)
            .and_then(|raw| storage.set(&self.storage_key, &raw));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to save cart to storage");
        }
    }

    // -- Mutations ---------------------------------------------------------

    /// Add `quantity` of an item.
    ///
    /// An existing entry is incremented in place. Otherwise the item is
    /// resolved through the catalog (current page first, then a single-item
    /// fetch). Concurrent calls for the same id share one lookup, and the
    /// later ones increment the entry the first one created.
    ///
    /// Returns `false`, leaving the cart unchanged, if the item cannot be
    /// resolved or `quantity` is not positive.
    pub async fn add_item(&self, id: ItemId, quantity: i64) -> bool {
        if quantity <= 0 {
            tracing::debug!(item_id = id, quantity, "Ignoring non-positive add");
            return false;
        }
        if self.increment_existing(id, quantity) {
            return true;
        }

        let resolution = self.resolution_for(id);
        let item = {
            let _pending = PendingGuard {
                pending: &self.pending,
                id,
                resolution: resolution.clone(),
            };
            resolution.await
        };

        let Some(item) = item else {
            tracing::warn!(item_id = id, "Item with ID {} not found", id);
            return false;
        };

        let mut state = self.state.lock();
        state
            .entries
            .entry(id)
            .and_modify(|entry| entry.quantity = entry.quantity.saturating_add(quantity))
            .or_insert(CartEntry { item, quantity });
        self.persist(&state.entries);
        true
    }

    fn increment_existing(&self, id: ItemId, quantity: i64) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.entries.get_mut(&id) else {
            return false;
        };
        entry.quantity = entry.quantity.saturating_add(quantity);
        self.persist(&state.entries);
        true
    }

    fn resolution_for(&self, id: ItemId) -> Resolution {
        self.pending
            .lock()
            .entry(id)
            .or_insert_with(|| {
                let catalog = Arc::clone(&self.catalog);
                async move { catalog.get_item_by_id(id).await }
                    .boxed()
                    .shared()
            })
            .clone()
    }

    /// Remove an entry. Absent ids are a no-op, but the cart is still saved.
    pub fn remove_item(&self, id: ItemId) {
        let mut state = self.state.lock();
        state.entries.remove(&id);
        self.persist(&state.entries);
    }

    /// Set an entry's quantity. A quantity of zero or less removes the entry;
    /// an id not in the cart is ignored.
    pub fn update_quantity(&self, id: ItemId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }

        let mut state = self.state.lock();
        match state.entries.get_mut(&id) {
            Some(entry) => entry.quantity = quantity,
            None => {
                tracing::debug!(item_id = id, "Quantity update for item not in cart");
                return;
            }
        }
        self.persist(&state.entries);
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        self.persist(&state.entries);
    }

    // -- Reads -------------------------------------------------------------

    /// Quantity of an item in the cart, or 0.
    pub fn get_item_quantity(&self, id: ItemId) -> i64 {
        self.state
            .lock()
            .entries
            .get(&id)
            .map_or(0, |entry| entry.quantity)
    }

    /// Sum of all entry quantities.
    pub fn total_items(&self) -> i64 {
        self.state
            .lock()
            .entries
            .values()
            .map(|entry| entry.quantity)
            .sum()
    }

    /// Sum of price times quantity over all entries.
    pub fn subtotal(&self) -> f64 {
        self.state.lock().entries.values().map(CartEntry::line_total).sum()
    }

    pub fn entry(&self, id: ItemId) -> Option<CartEntry> {
        self.state.lock().entries.get(&id).cloned()
    }

    /// Snapshot of every entry, ordered by id.
    pub fn entries(&self) -> CartContents {
        self.state.lock().entries.clone()
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    /// Number of item lookups currently in flight.
    pub fn pending_lookups(&self) -> usize {
        self.pending.lock().len()
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CartStore")
            .field("entries", &state.entries.len())
            .field("loaded", &state.loaded)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}
