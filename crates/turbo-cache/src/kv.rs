//! Typed cache handle with automatic JSON serialization.

use std::sync::Arc;

use crate::store::{KvStore, MemoryStore};
use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

/// Type-safe cache over any [`KvStore`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning shares the same backend.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Wrap a backend.
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// A cache over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Open a file-backed cache.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open_file(".turbo-cart/storage.json")?;
    /// ```
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_file(path: impl Into<std::path::PathBuf>) -> Result<Self, CacheError> {
        Ok(Self::new(crate::store::FileStore::open(path)?))
    }

    /// Open the default Spin Key-Value store.
    #[cfg(target_arch = "wasm32")]
    pub fn open_default() -> Result<Self, CacheError> {
        Ok(Self::new(crate::store::SpinStore::open_default()?))
    }

    /// Open a named Spin Key-Value store.
    #[cfg(target_arch = "wasm32")]
    pub fn open(name: &str) -> Result<Self, CacheError> {
        Ok(Self::new(crate::store::SpinStore::open(name)?))
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist and
    /// [`CacheError::SerializeError`] if it exists but doesn't decode as `T`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cart: Option<Cart> = cache.get("@RocketShoes:cart")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key)? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes)
    }

    /// Store raw bytes, bypassing serialization.
    pub fn set_raw(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.store.set(key, value)
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key)
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.store.keys()
    }
}
