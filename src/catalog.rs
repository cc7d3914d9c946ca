//! Catalog state: filters, pagination and the current page of items.
//!
//! Every successful load replaces the item map with the page the server
//! returned; nothing is merged across loads. Items outside the current page
//! are reachable through [`CatalogStore::get_item_by_id`], which falls back to
//! a single-item fetch.
//!
//! At most one load runs at a time. A load, filter change or page change
//! issued while another load is in flight returns [`LoadOutcome::Busy`]
//! without touching state and without queueing; callers that need the newer
//! intent re-issue it once the in-flight load settles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::{self, ITEMS_PATH, TOTAL_COUNT_HEADER};
use crate::error::{Result, StorefrontError};
use crate::models::{FilterOptions, Item, ItemId, PaginationState};
use crate::query_builder::catalog_query;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CatalogConfig {
    /// Page size, fixed for the lifetime of the store.
    pub items_per_page: u32,
    /// Upper bound on a single load. `None` waits indefinitely.
    pub load_timeout: Option<Duration>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            items_per_page: config::DEFAULT_ITEMS_PER_PAGE,
            load_timeout: Some(config::DEFAULT_LOAD_TIMEOUT),
        }
    }
}

/// What a load-triggering call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A query ran and its results are now the catalog state.
    Loaded,
    /// Nothing to do: filters unchanged or page out of range.
    Skipped,
    /// Another load was in flight; state was left untouched.
    Busy,
}

// ---------------------------------------------------------------------------
// LoadGuard
// ---------------------------------------------------------------------------

/// Holds the `loading` flag for the duration of one load.
///
/// Released on drop, so the flag is cleared on success, on error and when
/// the load future itself is dropped mid-flight.
struct LoadGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// CatalogStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CatalogState {
    items: HashMap<ItemId, Item>,
    /// Ids in the order the server returned them.
    order: Vec<ItemId>,
    filters: FilterOptions,
    pagination: PaginationState,
    loaded: bool,
}

pub struct CatalogStore {
    transport: Arc<dyn Transport>,
    state: RwLock<CatalogState>,
    loading: AtomicBool,
    cancel: Mutex<CancellationToken>,
    load_timeout: Option<Duration>,
}

impl CatalogStore {
    pub fn new(transport: Arc<dyn Transport>, config: CatalogConfig) -> Self {
        Self {
            transport,
            state: RwLock::new(CatalogState {
                items: HashMap::new(),
                order: Vec::new(),
                filters: FilterOptions::default(),
                pagination: PaginationState::new(config.items_per_page),
                loaded: false,
            }),
            loading: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            load_timeout: config.load_timeout,
        }
    }

    // -- Load-triggering operations ----------------------------------------

    /// Load the current page for the current filters.
    ///
    /// On failure the previous items, pagination and `loaded` flag are kept
    /// and the error is returned.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            tracing::debug!("Catalog load already in flight; skipping");
            return Ok(LoadOutcome::Busy);
        };

        let (filters, pagination) = {
            let state = self.state.read();
            (state.filters.clone(), state.pagination)
        };
        self.run_load(filters, pagination).await
    }

    /// Apply a partial filter update and reload from page 1.
    ///
    /// Only fields set in `patch` are considered. If none of them differs from
    /// the current filters this is a no-op and no request is made. The merged
    /// filters and the page reset are committed together with the results, so
    /// a failed reload leaves the previous filters in place.
    pub async fn update_filters(&self, patch: &FilterOptions) -> Result<LoadOutcome> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            tracing::debug!("Catalog load already in flight; filter update skipped");
            return Ok(LoadOutcome::Busy);
        };

        let (filters, pagination) = {
            let state = self.state.read();
            if !state.filters.differs_from_patch(patch) {
                tracing::debug!("Filters unchanged; skipping reload");
                return Ok(LoadOutcome::Skipped);
            }
            let mut pagination = state.pagination;
            pagination.current_page = 1;
            (state.filters.merged(patch), pagination)
        };
        self.run_load(filters, pagination).await
    }

    /// Move to `page` and reload. Pages outside `1..=total_pages` are ignored.
    pub async fn paginate(&self, page: u32) -> Result<LoadOutcome> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            tracing::debug!(page, "Catalog load already in flight; page change skipped");
            return Ok(LoadOutcome::Busy);
        };

        let (filters, pagination) = {
            let state = self.state.read();
            if !state.pagination.accepts_page(page) {
                tracing::debug!(
                    page,
                    total_pages = state.pagination.total_pages,
                    "Page out of range; ignoring"
                );
                return Ok(LoadOutcome::Skipped);
            }
            let mut pagination = state.pagination;
            pagination.current_page = page;
            (state.filters.clone(), pagination)
        };
        self.run_load(filters, pagination).await
    }

    /// Cancel the load currently in flight, if any.
    ///
    /// The cancelled call returns [`StorefrontError::Cancelled`] and leaves the
    /// catalog as it was.
    pub fn cancel_load(&self) {
        self.cancel.lock().cancel();
    }

    /// Run the query and commit its result. Caller must hold the load guard.
    async fn run_load(
        &self,
        filters: FilterOptions,
        pagination: PaginationState,
    ) -> Result<LoadOutcome> {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();

        let settle = self.fetch_settled(&filters, pagination);
        let result = match self.load_timeout {
            Some(limit) => tokio::select! {
                _ = token.cancelled() => Err(StorefrontError::Cancelled),
                r = tokio::time::timeout(limit, settle) => {
                    r.unwrap_or(Err(StorefrontError::Timeout(limit)))
                }
            },
            None => tokio::select! {
                _ = token.cancelled() => Err(StorefrontError::Cancelled),
                r = settle => r,
            },
        };

        let (items, pagination) = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(page = pagination.current_page, error = %e, "Error loading items");
                return Err(match e {
                    StorefrontError::Cancelled | StorefrontError::Timeout(_) => e,
                    other => StorefrontError::CatalogLoad(other.to_string()),
                });
            }
        };

        let mut state = self.state.write();
        state.order = items.iter().map(|item| item.id).collect();
        state.items = items.into_iter().map(|item| (item.id, item)).collect();
        state.filters = filters;
        state.pagination = pagination;
        state.loaded = true;

        tracing::info!(
            page = pagination.current_page,
            total_pages = pagination.total_pages,
            total_items = pagination.total_items,
            count = state.order.len(),
            "Catalog loaded"
        );
        Ok(LoadOutcome::Loaded)
    }

    /// Fetch the requested page. If the reported total no longer reaches that
    /// page, fetch the clamped page instead so the committed items always
    /// belong to the committed page number. Clamping only lowers the page, so
    /// this settles.
    async fn fetch_settled(
        &self,
        filters: &FilterOptions,
        mut pagination: PaginationState,
    ) -> Result<(Vec<Item>, PaginationState)> {
        loop {
            let requested = pagination.current_page;
            let (items, total) = self.fetch_page(filters, &pagination).await?;
            pagination.apply_total(total);
            if pagination.current_page == requested {
                return Ok((items, pagination));
            }
            tracing::debug!(
                requested,
                page = pagination.current_page,
                "Requested page past the end of the results; reloading"
            );
        }
    }

    async fn fetch_page(
        &self,
        filters: &FilterOptions,
        pagination: &PaginationState,
    ) -> Result<(Vec<Item>, u64)> {
        let path = catalog_query(ITEMS_PATH, filters, pagination).build();
        tracing::debug!(%path, "Fetching catalog page");
        let resp = self.transport.get(&path).await?;
        let items: Vec<Item> = resp.json()?;
        let total = match resp.header(TOTAL_COUNT_HEADER) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or(0),
            None => {
                tracing::debug!("Response has no {} header", TOTAL_COUNT_HEADER);
                0
            }
        };
        Ok((items, total))
    }

    // -- Item lookup -------------------------------------------------------

    /// Return an item by id, from the current page if present, otherwise by
    /// fetching it individually.
    ///
    /// Returns `None` if the fetch fails or the item does not exist. A fetched
    /// item is not added to the current page.
    pub async fn get_item_by_id(&self, id: ItemId) -> Option<Item> {
        if let Some(item) = self.item(id) {
            return Some(item);
        }

        let path = format!("{}/{}", ITEMS_PATH, id);
        let resp = match self.transport.get(&path).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(item_id = id, error = %e, "Failed to fetch item");
                return None;
            }
        };
        match resp.json::<Item>() {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!(item_id = id, error = %e, "Item not found");
                None
            }
        }
    }

    /// Cached lookup against the current page only.
    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.state.read().items.get(&id).cloned()
    }

    // -- Snapshots ---------------------------------------------------------

    /// Items on the current page, in server order.
    pub fn items(&self) -> Vec<Item> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|id| state.items.get(id).cloned())
            .collect()
    }

    /// Ids on the current page, in server order.
    pub fn keys(&self) -> Vec<ItemId> {
        self.state.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    pub fn filters(&self) -> FilterOptions {
        self.state.read().filters.clone()
    }

    pub fn pagination(&self) -> PaginationState {
        self.state.read().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CatalogStore")
            .field("items", &state.order.len())
            .field("filters", &state.filters)
            .field("pagination", &state.pagination)
            .field("loading", &self.is_loading())
            .field("loaded", &state.loaded)
            .finish()
    }
}
