//! Type-safe Key-Value storage layer for the TurboCommerce storefront cart.
//!
//! Provides a small, ergonomic API for keeping JSON documents in a
//! key-value store: in memory, in a JSON file on disk, or in Spin's
//! Key-Value Store when compiled for `wasm32`.
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_cache::Cache;
//!
//! let cache = Cache::open_file("storage.json")?;
//!
//! // Store a value
//! cache.set("@RocketShoes:cart", &cart)?;
//!
//! // Retrieve a value
//! let cart: Option<Vec<Product>> = cache.get("@RocketShoes:cart")?;
//! ```

mod error;
mod kv;
mod store;

pub use error::CacheError;
pub use kv::Cache;
#[cfg(target_arch = "wasm32")]
pub use store::SpinStore;
pub use store::{FileStore, KvStore, MaybeSendSync, MemoryStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, KvStore};
}
