//! Cart line items and the cart sequence.
//!
//! [`Cart`] is an immutable value: every transition returns a new cart and
//! leaves the original untouched, so a store can compute the next state,
//! persist it, and only then swap it in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// One product and its requested quantity within the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(rename = "image")]
    pub image_url: String,
    /// Requested quantity, always at least 1.
    pub amount: u32,
}

impl LineItem {
    /// Build a line item from a catalog product.
    #[must_use]
    pub fn from_product(product: Product, amount: u32) -> Self {
        Self {
            product_id: product.product_id,
            title: product.title,
            price: product.price,
            image_url: product.image_url,
            amount,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.amount)
    }
}

/// Ordered cart contents, unique by product id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from a raw sequence.
    ///
    /// Keeps the first occurrence of each product id and drops items whose
    /// amount is zero, so a hand-edited snapshot can't break the invariants.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        let items = items
            .into_iter()
            .filter(|item| item.amount >= 1 && seen.insert(item.product_id))
            .collect();
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn find(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.find(product_id).is_some()
    }

    /// Number of distinct products (the header badge count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// A new cart with `item` appended.
    ///
    /// If the product is already present the existing line wins and the
    /// cart is returned unchanged.
    #[must_use]
    pub fn with_added(&self, item: LineItem) -> Self {
        let mut items = self.items.clone();
        if !self.contains(item.product_id) {
            items.push(item);
        }
        Self { items }
    }

    /// A new cart without `product_id`, or `None` if it isn't in the cart.
    #[must_use]
    pub fn without(&self, product_id: ProductId) -> Option<Self> {
        if !self.contains(product_id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .filter(|item| item.product_id != product_id)
            .cloned()
            .collect();
        Some(Self { items })
    }

    /// A new cart with `product_id` set to `amount`, or `None` if it isn't
    /// in the cart. Order and every other line are preserved.
    #[must_use]
    pub fn with_amount(&self, product_id: ProductId, amount: u32) -> Option<Self> {
        if !self.contains(product_id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.product_id == product_id {
                    LineItem {
                        amount,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        Some(Self { items })
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(items: Vec<LineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
