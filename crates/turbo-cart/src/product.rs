//! Product and stock types.

use crate::ids::ProductId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog product as carried in the cart.
///
/// Only `id` and `amount` mean anything to the cart. Every other field the
/// catalog returns (title, price, image, ...) is kept in `fields` and written
/// back out unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Quantity in the cart. Zero in catalog responses.
    #[serde(default)]
    pub amount: i64,
    /// Display and pricing fields, passed through untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Product {
    /// Create a product with no display fields.
    pub fn new(id: ProductId) -> Self {
        Self {
            id,
            amount: 0,
            fields: Map::new(),
        }
    }

    /// Set the display title.
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with_field("title", Value::String(title.into()))
    }

    /// Set the unit price as the catalog reports it.
    pub fn with_price(self, price: f64) -> Self {
        self.with_field("price", Value::from(price))
    }

    /// Set the image URL.
    pub fn with_image(self, image: impl Into<String>) -> Self {
        self.with_field("image", Value::String(image.into()))
    }

    /// Set an arbitrary passthrough field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Set the cart quantity.
    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    /// Display title, if the catalog sent one.
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    /// Unit price, if the catalog sent one.
    pub fn price(&self) -> Option<f64> {
        self.fields.get("price").and_then(Value::as_f64)
    }

    /// Image URL, if the catalog sent one.
    pub fn image(&self) -> Option<&str> {
        self.fields.get("image").and_then(Value::as_str)
    }
}

/// Available quantity for one product at the moment it was fetched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stock {
    /// Product the snapshot belongs to.
    pub product_id: ProductId,
    /// Units available.
    pub amount: i64,
}

impl Stock {
    /// Create a stock snapshot. Negative amounts are clamped to zero.
    pub fn new(product_id: ProductId, amount: i64) -> Self {
        Self {
            product_id,
            amount: amount.max(0),
        }
    }

    /// Check if a specific quantity is available.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        quantity <= self.amount
    }
}
