//! Cart snapshot type.

use std::collections::HashSet;

use crate::error::CartError;
use crate::ids::ProductId;
use crate::product::Product;
use serde::{Deserialize, Serialize};

/// An ordered list of cart entries, unique by product id.
///
/// Serialized as a bare JSON array of products. Values held by a
/// [`CartStore`](crate::CartStore) are immutable snapshots; the store builds
/// a new `Cart` for every committed change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from entries, rejecting duplicates and non-positive amounts.
    pub fn from_items(items: Vec<Product>) -> Result<Self, CartError> {
        let cart = Self { items };
        cart.validate()?;
        Ok(cart)
    }

    /// Check the structural invariants: ids are unique and every amount is
    /// at least one.
    pub fn validate(&self) -> Result<(), CartError> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(CartError::MalformedStoredState(format!(
                    "duplicate entry for product {}",
                    item.id
                )));
            }
            if item.amount < 1 {
                return Err(CartError::MalformedStoredState(format!(
                    "product {} has amount {}",
                    item.id, item.amount
                )));
            }
        }
        Ok(())
    }

    /// Entries in insertion order.
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    /// Iterate over entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.items.iter()
    }

    /// Get an entry by product ID.
    pub fn get(&self, product_id: ProductId) -> Option<&Product> {
        self.items.iter().find(|i| i.id == product_id)
    }

    /// Check if a product has an entry.
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all entries.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.amount).sum()
    }

    /// Set an existing entry's amount.
    pub(crate) fn set_amount(&mut self, product_id: ProductId, amount: i64) -> Result<(), CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == product_id)
            .ok_or(CartError::ProductNotFound(product_id))?;
        item.amount = amount;
        Ok(())
    }

    /// Add a product with the given amount, or set the amount if it is
    /// already present.
    pub(crate) fn put(&mut self, mut product: Product, amount: i64) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == product.id) {
            existing.amount = amount;
            return;
        }
        product.amount = amount;
        self.items.push(product);
    }

    /// Remove an entry, returning it.
    pub(crate) fn remove(&mut self, product_id: ProductId) -> Result<Product, CartError> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == product_id)
            .ok_or(CartError::ProductNotFound(product_id))?;
        Ok(self.items.remove(index))
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64) -> Product {
        Product::new(ProductId::new(id)).with_title(format!("Shoe {id}"))
    }

    #[test]
    fn test_put_appends_then_updates_in_place() {
        let mut cart = Cart::new();
        cart.put(product(1), 1);
        cart.put(product(2), 1);
        cart.put(product(1), 3);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.items()[0].id, ProductId::new(1));
        assert_eq!(cart.items()[0].amount, 3);
    }

    #[test]
    fn test_set_amount_missing() {
        let mut cart = Cart::new();
        let err = cart.set_amount(ProductId::new(5), 2).unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(id) if id == ProductId::new(5)));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut cart = Cart::new();
        for id in 1..=3 {
            cart.put(product(id), 1);
        }

        let removed = cart.remove(ProductId::new(2)).unwrap();
        assert_eq!(removed.id, ProductId::new(2));
        let ids: Vec<u64> = cart.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(cart.remove(ProductId::new(2)).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let items = vec![product(1).with_amount(1), product(1).with_amount(2)];
        assert!(matches!(
            Cart::from_items(items),
            Err(CartError::MalformedStoredState(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_amount() {
        let items = vec![product(1).with_amount(0)];
        assert!(Cart::from_items(items).is_err());
    }

    #[test]
    fn test_serializes_as_array() {
        let cart = Cart::from_items(vec![Product::new(ProductId::new(1)).with_amount(2)]).unwrap();
        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(json, r#"[{"id":1,"amount":2}]"#);

        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
