//! Query-string builder for the storefront items endpoint.
//!
//! Parameters keep insertion order and are percent-encoded only when the
//! final path is built. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use storefront_sdk::QueryBuilder;
//! let path = QueryBuilder::new("/items")
//!     .page(2, 20)
//!     .param("game", "pokemon")
//!     .build();
//! assert_eq!(path, "/items?_page=2&_limit=20&game=pokemon");
//! ```

use crate::config::{
    ALL, PARAM_GAME, PARAM_LIMIT, PARAM_ORDER, PARAM_PAGE, PARAM_PRICE_GTE, PARAM_PRICE_LTE,
    PARAM_SEARCH, PARAM_SORT, PARAM_TYPE,
};
use crate::models::{FilterOptions, PaginationState, PriceRange, SortOption};

/// Builds a path plus ordered query parameters.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    path: String,
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a builder targeting the given path.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            params: Vec::new(),
        }
    }

    /// Append a parameter unconditionally.
    pub fn param(&mut self, key: &str, value: &str) -> &mut Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a parameter if the value is present and non-empty. The value is
    /// sent as given; whitespace is not trimmed.
    pub fn param_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.param(key, v);
        }
        self
    }

    /// Like [`param_opt`](Self::param_opt), but also skips the `"all"` sentinel.
    pub fn param_unless_all(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        self.param_opt(key, value.filter(|v| *v != ALL))
    }

    /// Append page number and page size.
    pub fn page(&mut self, page: u32, limit: u32) -> &mut Self {
        self.param(PARAM_PAGE, &page.to_string());
        self.param(PARAM_LIMIT, &limit.to_string())
    }

    /// Append price bounds. Open ranges emit only the lower bound.
    pub fn price_range(&mut self, range: &PriceRange) -> &mut Self {
        self.param(PARAM_PRICE_GTE, &range.min);
        if let Some(max) = &range.max {
            self.param(PARAM_PRICE_LTE, max);
        }
        self
    }

    /// Append sort-by and order.
    pub fn sort(&mut self, sort: SortOption) -> &mut Self {
        let (by, order) = sort.sort_params();
        self.param(PARAM_SORT, by);
        self.param(PARAM_ORDER, order)
    }

    /// Parameters in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Build the final `path?query` string.
    pub fn build(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Synthesize the items query for a filter set and page window.
///
/// Deterministic: the same inputs always produce the same parameters in the
/// same order. A malformed price range is dropped rather than failing the
/// whole query.
pub fn catalog_query(
    path: &str,
    filters: &FilterOptions,
    pagination: &PaginationState,
) -> QueryBuilder {
    let mut qb = QueryBuilder::new(path);
    qb.page(pagination.current_page, pagination.items_per_page)
        .param_opt(PARAM_SEARCH, filters.search.as_deref())
        .param_unless_all(PARAM_GAME, filters.game.as_deref())
        .param_unless_all(PARAM_TYPE, filters.item_type.as_deref());

    if let Some(raw) = filters.price_range.as_deref() {
        match PriceRange::parse(raw) {
            Ok(Some(range)) => {
                qb.price_range(&range);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(price_range = raw, error = %e, "Ignoring price filter"),
        }
    }

    qb.sort(filters.sort.unwrap_or_default());
    qb
}
