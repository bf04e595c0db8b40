//! Cart operation errors.
//!
//! Each cart operation returns a `Result<(), CartError>` so callers can tell
//! the failure cases apart, and additionally reports a [`Notice`] to the
//! shopper. [`CartError::notice_for`] is the single place that maps an error
//! to the toast it produces.

use thiserror::Error;

use rocketshoes_core::ProductId;

use crate::api::ApiError;
use crate::notify::Notice;
use crate::storage::StorageError;

/// The cart operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
    UpdateAmount,
}

impl Operation {
    /// Generic failure notice for this operation.
    #[must_use]
    pub const fn failure_notice(self) -> Notice {
        match self {
            Self::Add => Notice::AddFailed,
            Self::Remove => Notice::RemoveFailed,
            Self::UpdateAmount => Notice::UpdateFailed,
        }
    }
}

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Catalog or stock lookup failed.
    #[error("Lookup failed: {0}")]
    Lookup(#[from] ApiError),

    /// The catalog returned no data for the product.
    #[error("Product {0} is not available in the catalog")]
    ProductUnavailable(ProductId),

    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Requested quantity is below 1.
    #[error("Invalid quantity {0}: must be at least 1")]
    InvalidAmount(i32),

    /// Requested quantity exceeds available stock.
    #[error("Product {product_id}: requested {requested}, only {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// Snapshot could not be persisted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// Notice shown when `operation` fails with this error.
    #[must_use]
    pub const fn notice_for(&self, operation: Operation) -> Notice {
        match self {
            Self::OutOfStock { .. } => Notice::OutOfStock,
            _ => operation.failure_notice(),
        }
    }

    /// Whether this is the soft stock rejection rather than a failure.
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        matches!(self, Self::OutOfStock { .. })
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
