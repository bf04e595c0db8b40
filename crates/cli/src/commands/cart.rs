//! Cart commands.
//!
//! Each invocation restores the cart from local storage, runs one operation
//! and exits. Notices go to the log; `list` writes JSON to stdout.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use rocketshoes_cart::{
    CartConfig, CartStore, FileStore, HttpCatalog, LineItem, TracingNotifier,
    UpdateProductAmount,
};
use rocketshoes_core::ProductId;

/// Store wired to the HTTP catalog and the on-disk snapshot.
pub type CliStore = CartStore<HttpCatalog, FileStore, TracingNotifier>;

/// Cart as printed by `list`.
#[derive(Debug, Serialize)]
struct CartSummary<'a> {
    items: &'a [LineItem],
    size: usize,
    total: String,
}

/// Build the store from environment configuration.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the HTTP client can't be built.
pub async fn open_store() -> Result<CliStore, Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;
    info!(
        api_url = %config.api_url,
        storage_dir = %config.storage_dir.display(),
        "Opening cart"
    );

    let catalog = HttpCatalog::new(&config)?;
    let storage = FileStore::new(&config.storage_dir);
    Ok(CartStore::load(catalog, storage, TracingNotifier).await)
}

/// Print the cart as JSON.
///
/// # Errors
///
/// Returns an error if stdout can't be written.
pub fn list(store: &CliStore) -> Result<(), Box<dyn std::error::Error>> {
    let cart = store.cart();
    let summary = CartSummary {
        items: cart.items(),
        size: cart.len(),
        total: cart.total().display(),
    };

    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &summary)?;
    writeln!(out)?;
    Ok(())
}

/// Add a product.
///
/// # Errors
///
/// Returns the cart error if the product could not be added.
pub async fn add(store: &CliStore, product_id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    store.add_product(product_id).await?;
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns the cart error if the product could not be removed.
pub async fn remove(
    store: &CliStore,
    product_id: ProductId,
) -> Result<(), Box<dyn std::error::Error>> {
    store.remove_product(product_id).await?;
    Ok(())
}

/// Set a product's quantity.
///
/// # Errors
///
/// Returns the cart error if the quantity could not be changed.
pub async fn update(
    store: &CliStore,
    product_id: ProductId,
    amount: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    store
        .update_product_amount(UpdateProductAmount { product_id, amount })
        .await?;
    info!(%product_id, amount, "Quantity updated");
    Ok(())
}
