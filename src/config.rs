use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "PUBLIC_API_BASE_URL";

/// Collection path on the storefront API.
pub const ITEMS_PATH: &str = "/items";

/// Response header carrying the unpaginated result count.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Storage key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "cart";

pub const DEFAULT_ITEMS_PER_PAGE: u32 = 20;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(60);

// Wire parameter names understood by the items endpoint.
pub const PARAM_PAGE: &str = "_page";
pub const PARAM_LIMIT: &str = "_limit";
pub const PARAM_SEARCH: &str = "q";
pub const PARAM_GAME: &str = "game";
pub const PARAM_TYPE: &str = "type";
pub const PARAM_PRICE_GTE: &str = "price_gte";
pub const PARAM_PRICE_LTE: &str = "price_lte";
pub const PARAM_SORT: &str = "_sort";
pub const PARAM_ORDER: &str = "_order";

/// Filter value meaning "no constraint".
pub const ALL: &str = "all";

pub fn default_storage_dir() -> PathBuf {
    if let Some(data) = dirs::data_local_dir() {
        data.join("storefront-sdk")
    } else {
        PathBuf::from(".storefront-sdk")
    }
}

/// Read the API base URL from the process environment.
///
/// A `.env` file in the working directory is loaded first if present.
pub fn base_url_from_env() -> Option<String> {
    let _ = dotenvy::dotenv();
    std::env::var(BASE_URL_ENV)
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
}
