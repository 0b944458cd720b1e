//! Storefront JSON catalog adapter.
//!
//! Several of the monitored shops expose their collections as a JSON
//! product feed at `<base>/collections/<handle>/products.json`:
//!
//! ```text
//! { "products": [
//!     { "id": 9092534599903, "title": "Sayaka", "handle": "sayaka",
//!       "vendor": "Ippodo Tea",
//!       "variants": [ { "sku": "IPD-SAY-40", "available": true } ] } ] }
//! ```
//!
//! An item is in stock when any of its variants is available. The item id
//! is the first non-empty variant SKU, falling back to the product id.
//!
//! Feeds are paged. Pages of [`FEED_PAGE_SIZE`] products are requested
//! until one comes back empty, up to [`MAX_FEED_PAGES`].

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::Deserialize;
use std::future::Future;

use crate::types::{Brand, Item, ItemId, Snapshot, Source, SourceItems, StockStatus};
use super::SourceError;

/// Products requested per feed page.
pub const FEED_PAGE_SIZE: usize = 250;

/// Upper bound on pages read in one poll.
pub const MAX_FEED_PAGES: u32 = 40;

/// Where and how to read one catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Catalog being read.
    pub source: Source,
    /// Shop origin, e.g. `https://ippodotea.com`.
    pub base_url: String,
    /// Collection handle, e.g. `matcha`.
    pub collection: String,
    /// Brand for every item. `None` matches each product's vendor.
    pub brand: Option<Brand>,
    /// Only products whose title matches are kept.
    pub name_filter: Option<Regex>,
}

impl CatalogConfig {
    /// Create a config with no fixed brand and no name filter.
    pub fn new(source: Source, base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            brand: None,
            name_filter: None,
        }
    }

    /// Attribute every item to `brand`.
    pub fn with_brand(mut self, brand: Brand) -> Self {
        self.brand = Some(brand);
        self
    }

    /// Keep only products whose title matches `filter`.
    pub fn with_name_filter(mut self, filter: Regex) -> Self {
        self.name_filter = Some(filter);
        self
    }

    /// Feed URL.
    pub fn feed_url(&self) -> String {
        format!("{}/collections/{}/products.json", self.base_url, self.collection)
    }

    /// URL of one feed page, numbered from 1.
    pub fn page_url(&self, page: u32) -> String {
        format!("{}?limit={}&page={}", self.feed_url(), FEED_PAGE_SIZE, page)
    }

    /// Product page URL for a handle.
    pub fn product_url(&self, handle: &str) -> String {
        format!("{}/products/{}", self.base_url, handle)
    }
}

#[derive(Debug, Deserialize)]
struct Feed {
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    id: u64,
    title: String,
    handle: String,
    #[serde(default)]
    vendor: String,
    #[serde(default)]
    variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
struct Variant {
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    available: bool,
}

/// Parse a product feed body into snapshots stamped with `as_of`.
pub fn parse_catalog(
    config: &CatalogConfig,
    body: &str,
    as_of: DateTime<Utc>,
) -> Result<SourceItems, SourceError> {
    parse_feed_page(config, body, as_of).map(|(items, _)| items)
}

/// Read every page of a feed through `fetch` and merge the results.
///
/// `fetch` gets a page URL and returns its body. Any page failing fails
/// the whole poll, so a partial catalog is never published.
pub async fn collect_pages<F, Fut>(
    config: &CatalogConfig,
    as_of: DateTime<Utc>,
    mut fetch: F,
) -> Result<SourceItems, SourceError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, SourceError>>,
{
    let mut items = SourceItems::new();
    for page in 1..=MAX_FEED_PAGES {
        let body = fetch(config.page_url(page)).await?;
        let (page_items, products) = parse_feed_page(config, &body, as_of)?;
        if products == 0 {
            return Ok(items);
        }
        items.extend(page_items);
    }
    tracing::warn!(source = %config.source, pages = MAX_FEED_PAGES, "Feed page limit reached");
    Ok(items)
}

/// Parse one page; also returns how many products it listed before filtering.
fn parse_feed_page(
    config: &CatalogConfig,
    body: &str,
    as_of: DateTime<Utc>,
) -> Result<(SourceItems, usize), SourceError> {
    let feed: Feed = serde_json::from_str(body)
        .map_err(|e| SourceError::Parse(format!("{}: {}", config.source, e)))?;
    let products = feed.products.len();

    let mut items = SourceItems::new();
    for product in feed.products {
        if let Some(filter) = &config.name_filter {
            if !filter.is_match(&product.title) {
                continue;
            }
        }

        let id = product
            .variants
            .iter()
            .filter_map(|v| v.sku.as_deref())
            .map(str::trim)
            .find(|sku| !sku.is_empty())
            .map(ItemId::from)
            .unwrap_or_else(|| ItemId::new(product.id.to_string()));

        let status = if product.variants.iter().any(|v| v.available) {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        };
        let brand = config.brand.unwrap_or_else(|| Brand::match_name(&product.vendor));

        let snapshot = Snapshot::new(
            Item::new(id.clone(), brand, product.title.trim()),
            config.product_url(&product.handle),
            status,
            as_of,
        );
        items.insert(id, snapshot);
    }

    Ok((items, products))
}

#[cfg(feature = "http")]
pub use http::JsonCatalogSource;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::source::{SourceAdapter, SourceError};
    use crate::types::{Source, SourceItems};
    use super::{collect_pages, CatalogConfig};

    /// Adapter reading a storefront product feed over HTTP.
    #[derive(Debug, Clone)]
    pub struct JsonCatalogSource {
        config: CatalogConfig,
        client: reqwest::Client,
    }

    impl JsonCatalogSource {
        /// Create an adapter sharing `client`'s connection pool.
        pub fn new(config: CatalogConfig, client: reqwest::Client) -> Self {
            Self { config, client }
        }

        async fn fetch(&self, url: String) -> Result<String, SourceError> {
            let fetch_error = |e: reqwest::Error| SourceError::Fetch {
                url: url.clone(),
                reason: e.to_string(),
            };

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(fetch_error)?;
            response.text().await.map_err(fetch_error)
        }
    }

    #[async_trait]
    impl SourceAdapter for JsonCatalogSource {
        fn source(&self) -> Source {
            self.config.source
        }

        async fn scrape(&self) -> Result<SourceItems, SourceError> {
            collect_pages(&self.config, Utc::now(), |url| self.fetch(url)).await
        }
    }
}
