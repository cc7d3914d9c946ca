use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ITEMS_PER_PAGE;

// ---------------------------------------------------------------------------
// PaginationState: Page window over the server-side result set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current_page: u32,
    pub items_per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationState {
    /// A fresh state on page 1 with nothing loaded yet.
    ///
    /// `items_per_page` is clamped to at least 1.
    pub fn new(items_per_page: u32) -> Self {
        Self {
            current_page: 1,
            items_per_page: items_per_page.max(1),
            total_items: 0,
            total_pages: 0,
        }
    }

    /// `ceil(total_items / items_per_page)`.
    pub fn pages_for(total_items: u64, items_per_page: u32) -> u32 {
        let pages = total_items.div_ceil(u64::from(items_per_page.max(1)));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Whether `page` can be navigated to.
    pub fn accepts_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    /// Record a server-reported total and keep `current_page` in
    /// `1..=max(total_pages, 1)`.
    pub fn apply_total(&mut self, total_items: u64) {
        self.total_items = total_items;
        self.total_pages = Self::pages_for(total_items, self.items_per_page);
        self.current_page = self.current_page.clamp(1, self.total_pages.max(1));
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}
