use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ALL;
use crate::error::StorefrontError;

// ---------------------------------------------------------------------------
// SortOption: Fixed set of result orderings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// Featured items first, then newest.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Newest,
    Oldest,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Featured => "featured",
            SortOption::PriceAsc => "price-asc",
            SortOption::PriceDesc => "price-desc",
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
        }
    }

    /// The `(sort-by, order)` pair sent to the items endpoint.
    pub fn sort_params(&self) -> (&'static str, &'static str) {
        match self {
            SortOption::Featured => ("featured,createdAt", "desc,desc"),
            SortOption::PriceAsc => ("price", "asc"),
            SortOption::PriceDesc => ("price", "desc"),
            SortOption::Newest => ("createdAt", "desc"),
            SortOption::Oldest => ("createdAt", "asc"),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortOption::Featured => "Featured",
            SortOption::PriceAsc => "Price: Low to High",
            SortOption::PriceDesc => "Price: High to Low",
            SortOption::Newest => "Newest",
            SortOption::Oldest => "Oldest",
        }
    }
}

impl FromStr for SortOption {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "featured" => Ok(SortOption::Featured),
            "price-asc" => Ok(SortOption::PriceAsc),
            "price-desc" => Ok(SortOption::PriceDesc),
            "newest" => Ok(SortOption::Newest),
            "oldest" => Ok(SortOption::Oldest),
            other => Err(StorefrontError::InvalidArgument(format!(
                "Unknown sort option: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PriceRange: Parsed form of the `"min-max"` / `"min-+"` filter encoding
// ---------------------------------------------------------------------------

/// Price bounds decoded from a filter string.
///
/// Bounds keep the caller's textual form so the wire parameters match what
/// was selected (e.g. `"50"` rather than `"50.0"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRange {
    pub min: String,
    /// `None` for an open range (`"min-+"`).
    pub max: Option<String>,
}

impl PriceRange {
    /// Parse a price filter.
    ///
    /// Returns `Ok(None)` for the empty string and for `"all"`.
    pub fn parse(raw: &str) -> crate::Result<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() || raw == ALL {
            return Ok(None);
        }

        let (min, max) = raw.split_once('-').ok_or_else(|| {
            StorefrontError::InvalidArgument(format!("Malformed price range: {}", raw))
        })?;
        let min = parse_bound(min, raw)?;
        let max = match max.trim() {
            "+" => None,
            bound => Some(parse_bound(bound, raw)?),
        };

        Ok(Some(PriceRange { min, max }))
    }

    pub fn is_open(&self) -> bool {
        self.max.is_none()
    }
}

fn parse_bound(bound: &str, raw: &str) -> crate::Result<String> {
    let bound = bound.trim();
    match bound.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(bound.to_string()),
        _ => Err(StorefrontError::InvalidArgument(format!(
            "Malformed price range: {}",
            raw
        ))),
    }
}

// ---------------------------------------------------------------------------
// FilterOptions: Query intent for the catalog
// ---------------------------------------------------------------------------

/// Catalog filters.
///
/// All fields are optional. When used as a patch for
/// [`CatalogStore::update_filters`](crate::catalog::CatalogStore::update_filters),
/// a `None` field means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOption>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_game(mut self, game: impl Into<String>) -> Self {
        self.game = Some(game.into());
        self
    }

    pub fn with_price_range(mut self, range: impl Into<String>) -> Self {
        self.price_range = Some(range.into());
        self
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = Some(sort);
        self
    }

    /// True if applying `patch` would change at least one field.
    ///
    /// Only fields present in the patch are compared, and values are compared
    /// literally: setting `game` to `"all"` when it was unset counts as a change.
    pub fn differs_from_patch(&self, patch: &FilterOptions) -> bool {
        fn changed<T: PartialEq>(current: &Option<T>, patch: &Option<T>) -> bool {
            patch.is_some() && current != patch
        }

        changed(&self.search, &patch.search)
            || changed(&self.game, &patch.game)
            || changed(&self.price_range, &patch.price_range)
            || changed(&self.item_type, &patch.item_type)
            || changed(&self.sort, &patch.sort)
    }

    /// Shallow merge: every field present in `patch` overwrites the current one.
    pub fn merged(&self, patch: &FilterOptions) -> FilterOptions {
        FilterOptions {
            search: patch.search.clone().or_else(|| self.search.clone()),
            game: patch.game.clone().or_else(|| self.game.clone()),
            price_range: patch.price_range.clone().or_else(|| self.price_range.clone()),
            item_type: patch.item_type.clone().or_else(|| self.item_type.clone()),
            sort: patch.sort.or(self.sort),
        }
    }
}
