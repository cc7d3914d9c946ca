//! Storefront SDK for Rust.
//!
//! Client-side state for a storefront: a paginated, filterable catalog backed
//! by a JSON items API, and a shopping cart that persists across sessions.
//!
//! # Quick start
//!
//! ```no_run
//! use storefront_sdk::{FilterOptions, SortOption, Storefront};
//!
//! # async fn example() -> storefront_sdk::Result<()> {
//! let store = Storefront::builder()
//!     .base_url("http://localhost:3000")
//!     .build()?;
//!
//! // Load the first page, then narrow it down
//! store.catalog().load().await?;
//! store
//!     .catalog()
//!     .update_filters(&FilterOptions::new().with_game("pokemon").with_sort(SortOption::Newest))
//!     .await?;
//!
//! // Put something in the cart
//! store.cart().add_item(42, 2).await;
//! println!("{} items in cart", store.cart().total_items());
//! # Ok(())
//! # }
//! ```

pub mod cart;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod error;
pub mod models;
pub mod query_builder;
pub mod storage;
pub mod transport;

pub use cart::CartStore;
pub use catalog::{CatalogConfig, CatalogStore, LoadOutcome};
pub use debounce::Debouncer;
pub use error::{Result, StorefrontError};
pub use models::{
    CartContents, CartEntry, FilterOptions, Item, ItemId, PaginationState, PriceRange, SortOption,
};
pub use query_builder::QueryBuilder;
pub use storage::{CartStorage, FileStorage, MemoryStorage};
pub use transport::{HttpTransport, Method, Transport, TransportResponse};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// StorefrontBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Storefront`] instance.
///
/// Use [`Storefront::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](StorefrontBuilder::build) to create the
/// stores.
pub struct StorefrontBuilder {
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    items_per_page: u32,
    request_timeout: Duration,
    load_timeout: Option<Duration>,
    storage_dir: Option<PathBuf>,
    storage: Option<Arc<dyn CartStorage>>,
    persist_cart: bool,
}

impl Default for StorefrontBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            transport: None,
            items_per_page: config::DEFAULT_ITEMS_PER_PAGE,
            request_timeout: config::DEFAULT_REQUEST_TIMEOUT,
            load_timeout: Some(config::DEFAULT_LOAD_TIMEOUT),
            storage_dir: None,
            storage: None,
            persist_cart: true,
        }
    }
}

impl StorefrontBuilder {
    /// Start from the process environment.
    ///
    /// Reads the API base URL from `PUBLIC_API_BASE_URL`, loading a `.env`
    /// file first if one exists.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        builder.base_url = config::base_url_from_env();
        builder
    }

    /// Set the API base URL (e.g. `http://localhost:3000`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use a custom transport instead of the bundled HTTP client.
    ///
    /// When set, [`base_url`](Self::base_url) and
    /// [`request_timeout`](Self::request_timeout) are ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the catalog page size. Defaults to 20.
    pub fn items_per_page(mut self, n: u32) -> Self {
        self.items_per_page = n;
        self
    }

    /// Set the HTTP timeout for individual requests.
    ///
    /// Defaults to 30 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the upper bound on a catalog load, or `None` to wait indefinitely.
    ///
    /// Defaults to 60 seconds.
    pub fn load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Persist the cart as files under `path`.
    ///
    /// If neither this nor [`storage`](Self::storage) is set, the
    /// platform-appropriate local data directory is used.
    pub fn storage_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Persist the cart through a custom storage backend.
    pub fn storage(mut self, storage: Arc<dyn CartStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Keep the cart in memory only. The cart never reports itself loaded.
    pub fn without_storage(mut self) -> Self {
        self.persist_cart = false;
        self
    }

    /// Build the stores and hydrate the cart from storage.
    ///
    /// No catalog request is made; call [`CatalogStore::load`] when the
    /// first page is needed.
    pub fn build(self) -> Result<Storefront> {
        if self.items_per_page == 0 {
            return Err(StorefrontError::InvalidArgument(
                "items_per_page must be at least 1".to_string(),
            ));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let base_url = self.base_url.ok_or_else(|| {
                    StorefrontError::InvalidArgument(format!(
                        "No base URL configured; set one on the builder or via {}",
                        config::BASE_URL_ENV
                    ))
                })?;
                Arc::new(HttpTransport::new(base_url, self.request_timeout)?)
            }
        };

        let storage: Option<Arc<dyn CartStorage>> = if !self.persist_cart {
            None
        } else if let Some(storage) = self.storage {
            Some(storage)
        } else {
            Some(Arc::new(FileStorage::new(self.storage_dir)?))
        };

        let catalog = Arc::new(CatalogStore::new(
            transport,
            CatalogConfig {
                items_per_page: self.items_per_page,
                load_timeout: self.load_timeout,
            },
        ));
        let cart = Arc::new(CartStore::new(Arc::clone(&catalog), storage));
        cart.load();

        Ok(Storefront { catalog, cart })
    }
}

// ---------------------------------------------------------------------------
// Storefront
// ---------------------------------------------------------------------------

/// The catalog and cart for one client session.
///
/// Both stores are reference-counted, so handles can be cloned out and moved
/// into tasks while the `Storefront` stays with its owner.
#[derive(Clone)]
pub struct Storefront {
    catalog: Arc<CatalogStore>,
    cart: Arc<CartStore>,
}

impl Storefront {
    /// Create a new builder for configuring the stores.
    pub fn builder() -> StorefrontBuilder {
        StorefrontBuilder::default()
    }

    /// Access the catalog store.
    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    /// Access the cart store.
    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }
}

impl fmt::Display for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pagination = self.catalog.pagination();
        write!(
            f,
            "Storefront(items={}, page={}/{}, cart_items={}, cart_loaded={})",
            self.catalog.len(),
            pagination.current_page,
            pagination.total_pages,
            self.cart.total_items(),
            self.cart.is_loaded()
        )
    }
}
