//! Storefront shopping-cart state for TurboCommerce.
//!
//! A [`CartStore`] owns the shopper's cart: an ordered list of products,
//! unique by id, each with a positive `amount`. It exposes three mutations:
//!
//! - **add_product**: one more unit, checked against the stock endpoint
//! - **remove_product**: drop an entry
//! - **update_product_amount**: set an exact amount, checked against stock
//!
//! Each successful mutation is written to key-value storage before it becomes
//! the new in-memory snapshot. Rejected or failed mutations leave the cart
//! unchanged and raise a [`Notice`] on the configured [`Notifier`].
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_cart::prelude::*;
//! use turbo_cache::Cache;
//!
//! let store = CartStore::builder(
//!     HttpCatalog::with_base_url("http://localhost:3333"),
//!     Cache::open_file("storage.json")?,
//! )
//! .open();
//!
//! store.add_product(ProductId::new(1)).await?;
//! println!("{} item(s)", store.cart().item_count());
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod notify;
pub mod product;
pub mod store;

pub use cart::Cart;
pub use catalog::{CatalogSource, HttpCatalog, InMemoryCatalog};
pub use error::CartError;
pub use ids::ProductId;
pub use notify::{Messages, MemoryNotifier, Notice, NoticeKind, Notifier, TracingNotifier};
pub use product::{Product, Stock};
pub use store::{CartStore, CartStoreBuilder, UpdateProductAmount, DEFAULT_STORAGE_KEY};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cart::Cart;
    pub use crate::catalog::{CatalogSource, HttpCatalog, InMemoryCatalog};
    pub use crate::error::CartError;
    pub use crate::ids::ProductId;
    pub use crate::notify::{Messages, Notice, NoticeKind, Notifier};
    pub use crate::product::{Product, Stock};
    pub use crate::store::{CartStore, UpdateProductAmount};
}
