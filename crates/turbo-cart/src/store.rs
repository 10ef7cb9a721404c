//! The cart store: validated mutations, persistence and change notification.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use turbo_cache::Cache;

use crate::cart::Cart;
use crate::catalog::CatalogSource;
use crate::error::CartError;
use crate::ids::ProductId;
use crate::notify::{Messages, NoticeKind, Notifier, TracingNotifier};

/// Storage key the cart is persisted under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Arguments for [`CartStore::update_product_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// New absolute amount. Non-positive values are ignored.
    pub amount: i64,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::Update => "update",
        }
    }

    fn notice_kind(self, err: &CartError) -> NoticeKind {
        let stock = matches!(err, CartError::StockExceeded { .. });
        match (self, stock) {
            (Operation::Add, true) => NoticeKind::AddStockExceeded,
            (Operation::Add, false) => NoticeKind::AddFailed,
            (Operation::Remove, _) => NoticeKind::RemoveFailed,
            (Operation::Update, true) => NoticeKind::UpdateStockExceeded,
            (Operation::Update, false) => NoticeKind::UpdateFailed,
        }
    }
}

/// Builder for [`CartStore`].
pub struct CartStoreBuilder<C, N = TracingNotifier> {
    catalog: C,
    cache: Cache,
    notifier: N,
    storage_key: String,
    messages: Messages,
}

impl<C: CatalogSource> CartStoreBuilder<C, TracingNotifier> {
    fn new(catalog: C, cache: Cache) -> Self {
        Self {
            catalog,
            cache,
            notifier: TracingNotifier,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            messages: Messages::default(),
        }
    }
}

impl<C: CatalogSource, N: Notifier> CartStoreBuilder<C, N> {
    /// Send notices to a different sink.
    pub fn notifier<M: Notifier>(self, notifier: M) -> CartStoreBuilder<C, M> {
        CartStoreBuilder {
            catalog: self.catalog,
            cache: self.cache,
            notifier,
            storage_key: self.storage_key,
            messages: self.messages,
        }
    }

    /// Persist under a different key.
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Use different notice texts.
    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Load the persisted cart and build the store.
    pub fn open(self) -> CartStore<C, N> {
        let initial = load_cart(&self.cache, &self.storage_key);
        let (state, _) = watch::channel(Arc::new(initial));
        CartStore {
            catalog: self.catalog,
            cache: self.cache,
            notifier: self.notifier,
            storage_key: self.storage_key,
            messages: self.messages,
            state,
        }
    }
}

/// Read the persisted cart, falling back to empty on any problem.
fn load_cart(cache: &Cache, key: &str) -> Cart {
    let result = cache
        .get::<Cart>(key)
        .map_err(|e| CartError::MalformedStoredState(e.to_string()))
        .and_then(|cart| match cart {
            Some(cart) => cart.validate().map(|()| cart),
            None => Ok(Cart::new()),
        });

    match result {
        Ok(cart) => {
            tracing::debug!(key, entries = cart.len(), "loaded cart");
            cart
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring stored cart");
            Cart::new()
        }
    }
}

/// Authoritative cart state for one shopper.
///
/// Every mutation either commits completely (written to storage, published
/// as the new snapshot, observers woken) or leaves the cart untouched and
/// raises a notice. Failures are also returned to the caller, who is free to
/// ignore them.
///
/// Mutations triggered concurrently are not serialized against each other;
/// each validates against the snapshot it started from.
///
/// # Example
///
/// ```rust,ignore
/// let store = CartStore::builder(HttpCatalog::with_base_url(url), cache).open();
///
/// store.add_product(ProductId::new(1)).await?;
/// store.update_product_amount(UpdateProductAmount { product_id: ProductId::new(1), amount: 3 }).await?;
///
/// for item in store.cart().iter() {
///     println!("{} x{}", item.id, item.amount);
/// }
/// ```
pub struct CartStore<C, N = TracingNotifier> {
    catalog: C,
    cache: Cache,
    notifier: N,
    storage_key: String,
    messages: Messages,
    state: watch::Sender<Arc<Cart>>,
}

impl<C: CatalogSource> CartStore<C, TracingNotifier> {
    /// Start building a store.
    pub fn builder(catalog: C, cache: Cache) -> CartStoreBuilder<C, TracingNotifier> {
        CartStoreBuilder::new(catalog, cache)
    }
}

impl<C: CatalogSource, N: Notifier> CartStore<C, N> {
    /// Open a store with default key and messages.
    pub fn open(catalog: C, cache: Cache, notifier: N) -> Self {
        CartStore::builder(catalog, cache).notifier(notifier).open()
    }

    /// Current cart snapshot.
    pub fn cart(&self) -> Arc<Cart> {
        self.state.borrow().clone()
    }

    /// Watch for committed changes.
    ///
    /// The receiver sees the snapshot current at subscription time and is
    /// marked changed after each successful mutation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.state.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// New entries start at 1 and carry the catalog's product details.
    pub async fn add_product(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let result = self.try_add(product_id).await;
        self.finish(Operation::Add, product_id, result)
    }

    /// Remove a product's entry. Missing entries are an error.
    pub fn remove_product(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let result = self.try_remove(product_id);
        self.finish(Operation::Remove, product_id, result)
    }

    /// Set a product's amount.
    ///
    /// Non-positive amounts are ignored without a notice; callers are
    /// expected to stop them at the input.
    pub async fn update_product_amount(
        &self,
        update: UpdateProductAmount,
    ) -> Result<Arc<Cart>, CartError> {
        if update.amount <= 0 {
            tracing::debug!(product_id = %update.product_id, amount = update.amount, "ignoring non-positive amount");
            return Ok(self.cart());
        }
        let result = self.try_update(update).await;
        self.finish(Operation::Update, update.product_id, result)
    }

    async fn try_add(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let current = self.cart();
        let stock = self.catalog.stock(product_id).await?;

        let existing = current.get(product_id).map(|p| p.amount);
        let requested = match existing.unwrap_or(0).checked_add(1) {
            Some(requested) if stock.can_fulfill(requested) => requested,
            _ => {
                return Err(CartError::StockExceeded {
                    product_id,
                    requested: existing.unwrap_or(0).saturating_add(1),
                    available: stock.amount,
                });
            }
        };

        let mut next = Cart::clone(&current);
        match existing {
            Some(_) => next.set_amount(product_id, requested)?,
            None => {
                let product = self.catalog.product(product_id).await?;
                next.put(product, requested);
            }
        }
        self.commit(next)
    }

    fn try_remove(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let mut next = Cart::clone(&self.cart());
        next.remove(product_id)?;
        self.commit(next)
    }

    async fn try_update(&self, update: UpdateProductAmount) -> Result<Arc<Cart>, CartError> {
        let UpdateProductAmount { product_id, amount } = update;
        let current = self.cart();
        if !current.contains(product_id) {
            return Err(CartError::ProductNotFound(product_id));
        }

        let stock = self.catalog.stock(product_id).await?;
        if !stock.can_fulfill(amount) {
            return Err(CartError::StockExceeded {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        }

        let mut next = Cart::clone(&current);
        next.set_amount(product_id, amount)?;
        self.commit(next)
    }

    /// Persist, then publish.
    fn commit(&self, next: Cart) -> Result<Arc<Cart>, CartError> {
        self.cache.set(&self.storage_key, &next)?;
        let next = Arc::new(next);
        self.state.send_replace(next.clone());
        Ok(next)
    }

    fn finish(
        &self,
        operation: Operation,
        product_id: ProductId,
        result: Result<Arc<Cart>, CartError>,
    ) -> Result<Arc<Cart>, CartError> {
        match &result {
            Ok(cart) => {
                tracing::info!(
                    operation = operation.as_str(),
                    product_id = %product_id,
                    entries = cart.len(),
                    items = cart.item_count(),
                    "cart updated"
                );
            }
            Err(err) => {
                let kind = operation.notice_kind(err);
                if err.is_rejection() {
                    tracing::info!(operation = operation.as_str(), product_id = %product_id, error = %err, "cart change rejected");
                } else {
                    tracing::warn!(operation = operation.as_str(), product_id = %product_id, error = %err, "cart change failed");
                }
                self.notifier.notify(&self.messages.notice(kind));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::notify::MemoryNotifier;
    use crate::product::Product;
    use turbo_cache::{CacheError, KvStore};

    type TestStore = CartStore<Arc<InMemoryCatalog>, Arc<MemoryNotifier>>;

    fn id(n: u64) -> ProductId {
        ProductId::new(n)
    }

    fn shoe(n: u64) -> Product {
        Product::new(id(n))
            .with_title(format!("Shoe {n}"))
            .with_price(100.0 + n as f64)
            .with_image(format!("https://cdn.example.com/{n}.jpg"))
    }

    fn catalog(stock: &[(u64, i64)]) -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        for (n, amount) in stock {
            catalog.insert(shoe(*n), *amount);
        }
        Arc::new(catalog)
    }

    fn open(catalog: Arc<InMemoryCatalog>, seed: &[(u64, i64)]) -> (TestStore, Cache, Arc<MemoryNotifier>) {
        let cache = Cache::in_memory();
        if !seed.is_empty() {
            let items = seed.iter().map(|(n, a)| shoe(*n).with_amount(*a)).collect();
            cache
                .set(DEFAULT_STORAGE_KEY, &Cart::from_items(items).unwrap())
                .unwrap();
        }
        let notifier = Arc::new(MemoryNotifier::new());
        let store = CartStore::open(catalog, cache.clone(), notifier.clone());
        (store, cache, notifier)
    }

    fn stored(cache: &Cache) -> Cart {
        cache.get(DEFAULT_STORAGE_KEY).unwrap().unwrap()
    }

    fn amounts(cart: &Cart) -> Vec<(u64, i64)> {
        cart.iter().map(|p| (p.id.get(), p.amount)).collect()
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl KvStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
            Err(CacheError::StoreError("quota exceeded".into()))
        }
        fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Ok(())
        }
        fn keys(&self) -> Result<Vec<String>, CacheError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_add_new_product_to_empty_cart() {
        let (store, cache, notifier) = open(catalog(&[(1, 5)]), &[]);

        let cart = store.add_product(id(1)).await.unwrap();

        assert_eq!(amounts(&cart), vec![(1, 1)]);
        assert_eq!(cart.items()[0].title(), Some("Shoe 1"));
        assert_eq!(stored(&cache), *cart);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_add_existing_increments_without_refetching_product() {
        let catalog = catalog(&[(1, 5)]);
        let (store, cache, _) = open(catalog.clone(), &[(1, 2)]);

        let cart = store.add_product(id(1)).await.unwrap();

        assert_eq!(amounts(&cart), vec![(1, 3)]);
        assert_eq!(catalog.product_requests(), 0);
        assert_eq!(amounts(&stored(&cache)), vec![(1, 3)]);
    }

    #[tokio::test]
    async fn test_add_beyond_stock_is_rejected() {
        let (store, cache, notifier) = open(catalog(&[(1, 1)]), &[(1, 1)]);

        let err = store.add_product(id(1)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::StockExceeded { requested: 2, available: 1, .. }
        ));
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
        assert_eq!(amounts(&stored(&cache)), vec![(1, 1)]);
        assert_eq!(notifier.kinds(), vec![NoticeKind::AddStockExceeded]);
        assert_eq!(notifier.notices()[0].message, Messages::default().stock_exceeded);
    }

    #[tokio::test]
    async fn test_add_at_amount_ceiling_is_rejected() {
        let (store, cache, notifier) = open(catalog(&[(1, 5)]), &[(1, i64::MAX)]);
        assert_eq!(amounts(&store.cart()), vec![(1, i64::MAX)]);

        let err = store.add_product(id(1)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::StockExceeded { requested: i64::MAX, available: 5, .. }
        ));
        assert_eq!(amounts(&store.cart()), vec![(1, i64::MAX)]);
        assert_eq!(amounts(&stored(&cache)), vec![(1, i64::MAX)]);
        assert_eq!(notifier.kinds(), vec![NoticeKind::AddStockExceeded]);
    }

    #[tokio::test]
    async fn test_add_out_of_stock_new_product() {
        let catalog = catalog(&[(4, 0)]);
        let (store, cache, notifier) = open(catalog.clone(), &[]);

        assert!(store.add_product(id(4)).await.is_err());
        assert!(store.cart().is_empty());
        assert!(!cache.exists(DEFAULT_STORAGE_KEY).unwrap());
        assert_eq!(catalog.product_requests(), 0);
        assert_eq!(notifier.kinds(), vec![NoticeKind::AddStockExceeded]);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_fetch_failure() {
        let (store, _, notifier) = open(catalog(&[]), &[]);

        let err = store.add_product(id(99)).await.unwrap_err();

        assert!(matches!(err, CartError::Fetch(ref e) if e.is_not_found()));
        assert!(store.cart().is_empty());
        assert_eq!(notifier.kinds(), vec![NoticeKind::AddFailed]);
        assert_ne!(
            notifier.notices()[0].message,
            Messages::default().stock_exceeded
        );
    }

    #[tokio::test]
    async fn test_add_when_catalog_offline() {
        let catalog = catalog(&[(1, 5)]);
        catalog.set_offline(true);
        let (store, _, notifier) = open(catalog, &[(1, 1)]);

        assert!(matches!(
            store.add_product(id(1)).await,
            Err(CartError::Fetch(_))
        ));
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
        assert_eq!(notifier.kinds(), vec![NoticeKind::AddFailed]);
    }

    #[test]
    fn test_remove_existing() {
        let (store, cache, notifier) = open(catalog(&[]), &[(3, 2)]);

        let cart = store.remove_product(id(3)).unwrap();

        assert!(cart.is_empty());
        assert!(stored(&cache).is_empty());
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_remove_missing_notifies() {
        let (store, cache, notifier) = open(catalog(&[]), &[(1, 1)]);

        let err = store.remove_product(id(2)).unwrap_err();

        assert!(matches!(err, CartError::ProductNotFound(p) if p == id(2)));
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
        assert_eq!(amounts(&stored(&cache)), vec![(1, 1)]);
        assert_eq!(notifier.kinds(), vec![NoticeKind::RemoveFailed]);
    }

    #[tokio::test]
    async fn test_update_sets_exact_amount() {
        let (store, cache, _) = open(catalog(&[(2, 10)]), &[(2, 3)]);

        let cart = store
            .update_product_amount(UpdateProductAmount { product_id: id(2), amount: 7 })
            .await
            .unwrap();

        assert_eq!(amounts(&cart), vec![(2, 7)]);
        assert_eq!(amounts(&stored(&cache)), vec![(2, 7)]);

        let cart = store
            .update_product_amount(UpdateProductAmount { product_id: id(2), amount: 1 })
            .await
            .unwrap();
        assert_eq!(amounts(&cart), vec![(2, 1)]);
    }

    #[tokio::test]
    async fn test_update_beyond_stock_is_rejected() {
        let (store, cache, notifier) = open(catalog(&[(2, 4)]), &[(2, 3)]);

        let err = store
            .update_product_amount(UpdateProductAmount { product_id: id(2), amount: 10 })
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::StockExceeded { requested: 10, available: 4, .. }));
        assert_eq!(amounts(&store.cart()), vec![(2, 3)]);
        assert_eq!(amounts(&stored(&cache)), vec![(2, 3)]);
        assert_eq!(notifier.kinds(), vec![NoticeKind::UpdateStockExceeded]);
    }

    #[tokio::test]
    async fn test_update_non_positive_is_silent() {
        let catalog = catalog(&[(2, 4)]);
        let (store, cache, notifier) = open(catalog.clone(), &[(2, 3)]);

        for amount in [0, -1, i64::MIN] {
            let cart = store
                .update_product_amount(UpdateProductAmount { product_id: id(2), amount })
                .await
                .unwrap();
            assert_eq!(amounts(&cart), vec![(2, 3)]);
        }

        // Also silent for products that are not in the cart.
        store
            .update_product_amount(UpdateProductAmount { product_id: id(8), amount: 0 })
            .await
            .unwrap();

        assert!(notifier.notices().is_empty());
        assert_eq!(catalog.stock_requests(), 0);
        assert_eq!(amounts(&stored(&cache)), vec![(2, 3)]);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let catalog = catalog(&[(5, 10)]);
        let (store, _, notifier) = open(catalog.clone(), &[(2, 3)]);

        let err = store
            .update_product_amount(UpdateProductAmount { product_id: id(5), amount: 2 })
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::ProductNotFound(_)));
        assert_eq!(catalog.stock_requests(), 0);
        assert_eq!(notifier.kinds(), vec![NoticeKind::UpdateFailed]);
    }

    #[tokio::test]
    async fn test_update_stock_lookup_failure() {
        let (store, _, notifier) = open(catalog(&[]), &[(2, 3)]);

        let err = store
            .update_product_amount(UpdateProductAmount { product_id: id(2), amount: 2 })
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Fetch(_)));
        assert_eq!(amounts(&store.cart()), vec![(2, 3)]);
        assert_eq!(notifier.kinds(), vec![NoticeKind::UpdateFailed]);
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_cart_unchanged() {
        let notifier = Arc::new(MemoryNotifier::new());
        let store = CartStore::open(
            catalog(&[(1, 5)]),
            Cache::new(ReadOnlyStore),
            notifier.clone(),
        );

        let err = store.add_product(id(1)).await.unwrap_err();

        assert!(matches!(err, CartError::Storage(_)));
        assert!(store.cart().is_empty());
        assert_eq!(notifier.kinds(), vec![NoticeKind::AddFailed]);
    }

    #[test]
    fn test_open_with_corrupt_storage_starts_empty() {
        let cache = Cache::in_memory();
        cache.set_raw(DEFAULT_STORAGE_KEY, b"[{\"id\": 1, \"amo").unwrap();

        let notifier = Arc::new(MemoryNotifier::new());
        let store = CartStore::open(catalog(&[]), cache, notifier.clone());

        assert!(store.cart().is_empty());
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_open_with_invalid_entries_starts_empty() {
        let cache = Cache::in_memory();
        cache
            .set_raw(
                DEFAULT_STORAGE_KEY,
                br#"[{"id":1,"amount":1},{"id":1,"amount":2}]"#,
            )
            .unwrap();

        let store = CartStore::builder(catalog(&[]), cache).open();
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_custom_key_and_messages() {
        let cache = Cache::in_memory();
        let notifier = Arc::new(MemoryNotifier::new());
        let store = CartStore::builder(catalog(&[(1, 1)]), cache.clone())
            .notifier(notifier.clone())
            .storage_key("@Storefront:cart")
            .messages(Messages::pt_br())
            .open();

        store.add_product(id(1)).await.unwrap();
        store.add_product(id(1)).await.unwrap_err();

        assert!(cache.exists("@Storefront:cart").unwrap());
        assert!(!cache.exists(DEFAULT_STORAGE_KEY).unwrap());
        assert_eq!(
            notifier.notices()[0].message,
            "Quantidade solicitada fora de estoque"
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_commits_only() {
        let (store, _, _) = open(catalog(&[(1, 1)]), &[]);
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.add_product(id(1)).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(amounts(&rx.borrow_and_update()), vec![(1, 1)]);

        store.add_product(id(1)).await.unwrap_err();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_snapshots_are_immutable() {
        let (store, _, _) = open(catalog(&[(1, 5)]), &[]);
        let before = store.cart();

        store.add_product(id(1)).await.unwrap();

        assert!(before.is_empty());
        assert_eq!(store.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_reopen_restores_cart() {
        let (store, cache, _) = open(catalog(&[(1, 5), (2, 5)]), &[]);
        store.add_product(id(1)).await.unwrap();
        store.add_product(id(2)).await.unwrap();
        store.add_product(id(1)).await.unwrap();
        let expected = store.cart();
        drop(store);

        let reopened = CartStore::builder(catalog(&[]), cache).open();
        assert_eq!(*reopened.cart(), *expected);
        assert_eq!(amounts(&reopened.cart()), vec![(1, 2), (2, 1)]);
    }

    #[tokio::test]
    async fn test_invariants_hold_over_operation_sequence() {
        let (store, cache, _) = open(catalog(&[(1, 3), (2, 1), (3, 5), (4, 0)]), &[]);

        // Deterministic LCG so the sequence is reproducible.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            seed >> 33
        };

        for _ in 0..200 {
            let product_id = id(next() % 5 + 1);
            let _ = match next() % 3 {
                0 => store.add_product(product_id).await,
                1 => store.remove_product(product_id),
                _ => {
                    let amount = (next() % 8) as i64 - 2;
                    store
                        .update_product_amount(UpdateProductAmount { product_id, amount })
                        .await
                }
            };

            let cart = store.cart();
            assert!(cart.validate().is_ok(), "invariant broken: {cart:?}");
            for item in cart.iter() {
                let limit = match item.id.get() {
                    1 => 3,
                    2 => 1,
                    3 => 5,
                    _ => 0,
                };
                assert!(item.amount <= limit);
            }
            if cache.exists(DEFAULT_STORAGE_KEY).unwrap() {
                assert_eq!(stored(&cache), *cart);
            }
        }
    }
}
