//! The cart store.
//!
//! [`CartStore`] owns the shopper's cart. It is the only thing that mutates
//! it, and every successful mutation is persisted as a full JSON snapshot
//! under [`CART_STORAGE_KEY`] before it becomes visible.
//!
//! Locking:
//! - Operations on the same product run one at a time (per-product guard,
//!   held across the catalog/stock lookup).
//! - The decide-persist-swap step runs under a short commit lock and always
//!   starts from the latest committed cart, so operations on different
//!   products never overwrite each other.
//! - The committed cart sits behind an `RwLock` that is never held across an
//!   `.await`; reading it never waits on the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

use rocketshoes_core::{Cart, LineItem, ProductId};

use crate::api::CatalogApi;
use crate::error::{CartError, Operation, Result};
use crate::notify::{Notice, Notifier};
use crate::storage::{CART_STORAGE_KEY, KeyValueStore, StorageError};

/// Request to set a line item's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Requested absolute quantity.
    pub amount: i32,
}

/// Shopping cart state container.
///
/// Cheaply cloneable via `Arc`; clones share the same cart.
pub struct CartStore<C, S, N> {
    inner: Arc<CartStoreInner<C, S, N>>,
}

struct CartStoreInner<C, S, N> {
    catalog: C,
    storage: S,
    notifier: N,
    cart: RwLock<Cart>,
    commit: AsyncMutex<()>,
    // One entry per product ever touched; the set is bounded by the catalog.
    product_locks: Mutex<HashMap<ProductId, Arc<AsyncMutex<()>>>>,
}

impl<C, S, N> Clone for CartStore<C, S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, S, N> CartStore<C, S, N>
where
    C: CatalogApi,
    S: KeyValueStore,
    N: Notifier,
{
    /// Create a store, restoring the cart from the persisted snapshot.
    ///
    /// A missing, unreadable or malformed snapshot yields an empty cart.
    pub async fn load(catalog: C, storage: S, notifier: N) -> Self {
        let cart = read_snapshot(&storage).await;
        debug!(items = cart.len(), "Cart restored");

        Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                storage,
                notifier,
                cart: RwLock::new(cart),
                commit: AsyncMutex::new(()),
                product_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A copy of the last committed cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner
            .cart
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.inner.catalog
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.inner.notifier
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart is bumped by one through
    /// [`update_product_amount`](Self::update_product_amount)'s rules (stock
    /// check, its notices). Otherwise the product is looked up in the
    /// catalog and appended with an amount of 1.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the lookup fails or yields no data, if the
    /// delegated update is rejected, or if the snapshot can't be persisted.
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<()> {
        let _guard = self.lock_product(product_id).await;

        let existing = self.cart().find(product_id).map(|item| item.amount);
        if let Some(current) = existing {
            let request = UpdateProductAmount {
                product_id,
                amount: i32::try_from(current)
                    .unwrap_or(i32::MAX)
                    .saturating_add(1),
            };
            let result = self.apply_amount(request).await;
            return self.finish(Operation::UpdateAmount, result, None);
        }

        let result = match self.inner.catalog.product(product_id).await {
            Ok(Some(product)) if product.product_id == product_id => {
                let item = LineItem::from_product(product, 1);
                self.commit_with(|cart| Ok(cart.with_added(item))).await
            }
            Ok(Some(product)) => {
                warn!(
                    returned = %product.product_id,
                    "Catalog returned a different product than requested"
                );
                Err(CartError::ProductUnavailable(product_id))
            }
            Ok(None) => Err(CartError::ProductUnavailable(product_id)),
            Err(e) => Err(e.into()),
        };

        self.finish(Operation::Add, result, Some(Notice::ProductAdded))
    }

    /// Remove a product's line item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the product isn't in the cart, or
    /// `CartError::Storage` if the snapshot can't be persisted.
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<()> {
        let _guard = self.lock_product(product_id).await;

        let result = self
            .commit_with(|cart| {
                cart.without(product_id)
                    .ok_or(CartError::NotInCart(product_id))
            })
            .await;

        self.finish(Operation::Remove, result, Some(Notice::ProductRemoved))
    }

    /// Set a line item's quantity, if stock allows.
    ///
    /// Success is silent; only failures are notified.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the stock lookup fails, the product isn't in
    /// the cart, the amount is below 1, stock is insufficient
    /// (`CartError::OutOfStock`), or the snapshot can't be persisted.
    #[instrument(skip(self))]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) -> Result<()> {
        let _guard = self.lock_product(request.product_id).await;
        let result = self.apply_amount(request).await;
        self.finish(Operation::UpdateAmount, result, None)
    }

    /// Stock lookup, then validation and commit against the latest cart.
    /// Caller holds the product guard.
    async fn apply_amount(&self, request: UpdateProductAmount) -> Result<()> {
        let UpdateProductAmount { product_id, amount } = request;

        let stock = self.inner.catalog.stock(product_id).await?;

        self.commit_with(|cart| {
            if !cart.contains(product_id) {
                return Err(CartError::NotInCart(product_id));
            }
            let new_amount = match u32::try_from(amount) {
                Ok(n) if n >= 1 => n,
                _ => return Err(CartError::InvalidAmount(amount)),
            };
            if !stock.covers(amount) {
                return Err(CartError::OutOfStock {
                    product_id,
                    requested: amount,
                    available: stock.amount,
                });
            }
            cart.with_amount(product_id, new_amount)
                .ok_or(CartError::NotInCart(product_id))
        })
        .await
    }

    /// Compute the next cart from the latest committed one, persist it,
    /// then make it current. Nothing changes if `decide` or the write fails.
    async fn commit_with<F>(&self, decide: F) -> Result<()>
    where
        F: FnOnce(&Cart) -> Result<Cart>,
    {
        let _commit = self.inner.commit.lock().await;

        let next = decide(&self.cart())?;
        let snapshot = serde_json::to_string(&next).map_err(StorageError::from)?;
        self.inner
            .storage
            .set_item(CART_STORAGE_KEY, &snapshot)
            .await?;

        let items = next.len();
        *self
            .inner
            .cart
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
        debug!(items, "Cart persisted");
        Ok(())
    }

    async fn lock_product(&self, product_id: ProductId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .inner
                .product_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(product_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Report the outcome of `operation` and hand the result back.
    fn finish(&self, operation: Operation, result: Result<()>, success: Option<Notice>) -> Result<()> {
        match &result {
            Ok(()) => {
                if let Some(notice) = success {
                    self.inner.notifier.notify(notice);
                }
            }
            Err(err) => {
                warn!(operation = ?operation, error = %err, "Cart operation rejected");
                self.inner.notifier.notify(err.notice_for(operation));
            }
        }
        result
    }
}

async fn read_snapshot<S: KeyValueStore>(storage: &S) -> Cart {
    match storage.get_item(CART_STORAGE_KEY).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding malformed cart snapshot");
            Cart::new()
        }),
        Ok(None) => Cart::new(),
        Err(e) => {
            warn!(error = %e, "Could not read cart snapshot");
            Cart::new()
        }
    }
}
