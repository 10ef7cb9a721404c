//! Remote product and stock lookups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Deserialize;
use turbo_data::{FetchClient, FetchError};

use crate::ids::ProductId;
use crate::product::{Product, Stock};

/// Source of product details and stock levels.
///
/// Any failure (transport, missing product, malformed body) is a
/// [`FetchError`]; the cart does not distinguish between them.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Current stock for a product.
    async fn stock(&self, product_id: ProductId) -> Result<Stock, FetchError>;

    /// Full product record.
    async fn product(&self, product_id: ProductId) -> Result<Product, FetchError>;
}

#[async_trait]
impl<C: CatalogSource + ?Sized> CatalogSource for Arc<C> {
    async fn stock(&self, product_id: ProductId) -> Result<Stock, FetchError> {
        (**self).stock(product_id).await
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, FetchError> {
        (**self).product(product_id).await
    }
}

#[derive(Deserialize)]
struct StockBody {
    amount: i64,
}

/// Catalog served over HTTP as `GET /products/{id}` and `GET /stock/{id}`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: FetchClient,
}

impl HttpCatalog {
    /// Create a catalog over a client whose base URL points at the API.
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Shorthand for a default client with the given base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(FetchClient::new().with_base_url(base_url))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn stock(&self, product_id: ProductId) -> Result<Stock, FetchError> {
        let body: StockBody = self.client.get_json(format!("/stock/{}", product_id)).await?;
        tracing::debug!(product_id = %product_id, available = body.amount, "fetched stock");
        Ok(Stock::new(product_id, body.amount))
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, FetchError> {
        let product: Product = self
            .client
            .get_json(format!("/products/{}", product_id))
            .await?;
        if product.id != product_id {
            return Err(FetchError::ParseError(format!(
                "requested product {} but catalog returned {}",
                product_id, product.id
            )));
        }
        tracing::debug!(product_id = %product_id, "fetched product");
        Ok(product)
    }
}

/// In-memory catalog (for development/testing).
///
/// Unknown ids answer like a 404 from the HTTP catalog. Setting the catalog
/// offline makes every lookup fail with a request error.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    stock: RwLock<HashMap<ProductId, i64>>,
    offline: AtomicBool,
    product_requests: AtomicUsize,
    stock_requests: AtomicUsize,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product with a stock level.
    pub fn with_product(self, product: Product, stock: i64) -> Self {
        self.insert(product, stock);
        self
    }

    /// Insert or replace a product and its stock level.
    pub fn insert(&self, product: Product, stock: i64) {
        let id = product.id;
        if let Ok(mut products) = self.products.write() {
            products.insert(id, product);
        }
        self.set_stock(id, stock);
    }

    /// Change the stock level for a product.
    pub fn set_stock(&self, product_id: ProductId, amount: i64) {
        if let Ok(mut stock) = self.stock.write() {
            stock.insert(product_id, amount);
        }
    }

    /// Simulate the catalog being unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of product detail lookups served.
    pub fn product_requests(&self) -> usize {
        self.product_requests.load(Ordering::SeqCst)
    }

    /// Number of stock lookups served.
    pub fn stock_requests(&self) -> usize {
        self.stock_requests.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), FetchError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(FetchError::RequestError("catalog offline".to_string()))
        } else {
            Ok(())
        }
    }
}

fn not_found(path: String) -> FetchError {
    FetchError::HttpError {
        status: 404,
        message: format!("{} not found", path),
    }
}

fn poisoned() -> FetchError {
    FetchError::RequestError("catalog lock poisoned".to_string())
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn stock(&self, product_id: ProductId) -> Result<Stock, FetchError> {
        self.stock_requests.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let stock = self.stock.read().map_err(|_| poisoned())?;
        stock
            .get(&product_id)
            .map(|amount| Stock::new(product_id, *amount))
            .ok_or_else(|| not_found(format!("/stock/{}", product_id)))
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, FetchError> {
        self.product_requests.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let products = self.products.read().map_err(|_| poisoned())?;
        products
            .get(&product_id)
            .cloned()
            .ok_or_else(|| not_found(format!("/products/{}", product_id)))
    }
}
