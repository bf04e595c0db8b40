//! Catalog and stock payloads.
//!
//! Field names follow the catalog API's JSON (`id`, `image`), which is also
//! the shape the cart snapshot is persisted in.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by `GET /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    #[serde(rename = "image")]
    pub image_url: String,
}

/// Available stock as returned by `GET /stock/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Catalog identifier.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    /// Maximum purchasable quantity right now.
    pub amount: i32,
}

impl Stock {
    /// Whether `requested` units can be purchased.
    #[must_use]
    pub const fn covers(&self, requested: i32) -> bool {
        self.amount >= requested
    }
}
