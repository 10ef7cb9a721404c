//! Cart error types.

use crate::ids::ProductId;
use thiserror::Error;
use turbo_cache::CacheError;
use turbo_data::FetchError;

/// Errors that can occur in cart operations.
#[derive(Error, Debug)]
pub enum CartError {
    /// Requested quantity is more than the stock endpoint reports.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    StockExceeded {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Product has no entry in the cart.
    #[error("Product not in cart: {0}")]
    ProductNotFound(ProductId),

    /// Stock or product lookup failed.
    #[error("Catalog fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Writing the cart to storage failed.
    #[error("Cart storage failed: {0}")]
    Storage(#[from] CacheError),

    /// Persisted cart could not be used.
    #[error("Malformed stored cart: {0}")]
    MalformedStoredState(String),
}

impl CartError {
    /// Expected rejections (stock, missing entry) as opposed to failures of
    /// the catalog or storage.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CartError::StockExceeded { .. } | CartError::ProductNotFound(_)
        )
    }
}
