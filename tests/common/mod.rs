//! Shared test fixtures for the storefront SDK integration tests.
//!
//! Provides `MockTransport`, an in-memory stand-in for the items API that
//! pages and filters a fixed item list, records every request path, and can
//! hold responses behind a semaphore to simulate slow requests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use storefront_sdk::{
    CartStorage, CatalogConfig, CatalogStore, Item, Method, Result, StorefrontError, Transport,
    TransportResponse,
};
use tokio::sync::Semaphore;

pub fn sample_item(id: u64) -> Item {
    Item {
        id,
        name: format!("Item {}", id),
        price: 10.0 * id as f64,
        old_price: if id % 3 == 0 { Some(12.0 * id as f64) } else { None },
        description: format!("Description of item {}", id),
        image_url: format!("https://cdn.example.com/items/{}.png", id),
        in_stock: id % 5 != 0,
        game: if id % 2 == 0 { "pokemon" } else { "magic" }.to_string(),
        type_field: if id % 4 == 0 { "booster" } else { "single" }.to_string(),
        created_at: format!("2024-01-{:02}T00:00:00Z", (id % 28) + 1),
        featured: id % 7 == 0,
    }
}

pub fn sample_items(n: u64) -> Vec<Item> {
    (1..=n).map(sample_item).collect()
}

/// Catalog over `transport` with 10 items per page and a 5s load timeout.
pub fn catalog_over(transport: Arc<MockTransport>) -> Arc<CatalogStore> {
    Arc::new(CatalogStore::new(
        transport,
        CatalogConfig {
            items_per_page: 10,
            load_timeout: Some(Duration::from_secs(5)),
        },
    ))
}

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

pub struct MockTransport {
    items: Mutex<Vec<Item>>,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
    fail_listing: AtomicBool,
    send_total: AtomicBool,
    offline: AtomicBool,
}

impl MockTransport {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            requests: Mutex::new(Vec::new()),
            gate: None,
            fail_listing: AtomicBool::new(false),
            send_total: AtomicBool::new(true),
            offline: AtomicBool::new(false),
        }
    }

    /// Every response waits for a permit from `gate`.
    pub fn gated(items: Vec<Item>, gate: Arc<Semaphore>) -> Self {
        let mut transport = Self::new(items);
        transport.gate = Some(gate);
        transport
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn set_send_total(&self, send: bool) {
        self.send_total.store(send, Ordering::SeqCst);
    }

    /// Replace the server-side item list.
    pub fn set_items(&self, items: Vec<Item>) {
        *self.items.lock() = items;
    }

    /// While offline every request fails before reaching the fake server.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn listing_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|p| p.starts_with("/items?"))
            .collect()
    }

    pub fn item_requests(&self, id: u64) -> usize {
        let path = format!("/items/{}", id);
        self.requests().iter().filter(|p| **p == path).count()
    }

    /// Wait until at least `n` requests have been issued.
    pub async fn wait_for_requests(&self, n: usize) {
        while self.requests.lock().len() < n {
            tokio::task::yield_now().await;
        }
    }

    fn list(&self, query: &str) -> TransportResponse {
        if self.fail_listing.load(Ordering::SeqCst) {
            return TransportResponse::failure(500, "Internal Server Error", HeaderMap::new());
        }

        let params = parse_query(query);
        let page: usize = params.get("_page").and_then(|v| v.parse().ok()).unwrap_or(1);
        let limit: usize = params.get("_limit").and_then(|v| v.parse().ok()).unwrap_or(10);

        let items = self.items.lock();
        let matching: Vec<&Item> = items
            .iter()
            .filter(|item| params.get("game").map_or(true, |g| item.game == *g))
            .filter(|item| params.get("type").map_or(true, |t| item.type_field == *t))
            .filter(|item| {
                params
                    .get("q")
                    .map_or(true, |q| item.name.to_lowercase().contains(&q.to_lowercase()))
            })
            .collect();

        let page_items: Vec<&Item> = matching
            .iter()
            .skip((page.max(1) - 1) * limit)
            .take(limit)
            .copied()
            .collect();

        let mut headers = HeaderMap::new();
        if self.send_total.load(Ordering::SeqCst) {
            headers.insert(
                "x-total-count",
                HeaderValue::from_str(&matching.len().to_string()).unwrap(),
            );
        }
        TransportResponse::success(200, serde_json::to_value(page_items).unwrap(), headers)
    }

    fn single(&self, id: &str) -> TransportResponse {
        let items = self.items.lock();
        let found = id
            .parse::<u64>()
            .ok()
            .and_then(|id| items.iter().find(|item| item.id == id));
        match found {
            Some(item) => {
                TransportResponse::success(200, serde_json::to_value(item).unwrap(), HeaderMap::new())
            }
            None => TransportResponse::failure(404, "Not Found", HeaderMap::new()),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        _body: Option<&Value>,
    ) -> Result<TransportResponse> {
        self.requests.lock().push(path.to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(StorefrontError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| StorefrontError::InvalidArgument("gate closed".into()))?
                .forget();
        }

        if method != Method::Get {
            return Ok(TransportResponse::failure(405, "Method Not Allowed", HeaderMap::new()));
        }

        Ok(match path.split_once('?') {
            Some((_, query)) => self.list(query),
            None => match path.strip_prefix("/items/") {
                Some(id) => self.single(id),
                None => TransportResponse::failure(404, "Not Found", HeaderMap::new()),
            },
        })
    }
}

/// Decode a query string into a map (last value wins).
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((
                urlencoding::decode(k).ok()?.into_owned(),
                urlencoding::decode(v).ok()?.into_owned(),
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Storage doubles
// ---------------------------------------------------------------------------

/// Storage whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingStorage;

impl CartStorage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StorefrontError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "storage is read-only",
        )))
    }
}

/// Storage whose reads always fail.
#[derive(Debug, Default)]
pub struct UnreadableStorage;

impl CartStorage for UnreadableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(StorefrontError::Io(std::io::Error::other("disk unavailable")))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }
}
