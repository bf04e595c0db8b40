//! RocketShoes cart library.
//!
//! Holds the shopper's cart, persists it to local storage after every
//! change, and validates quantity changes against the remote stock API.
//!
//! # Architecture
//!
//! - [`store::CartStore`] owns the cart and is the only thing that mutates it
//! - [`api::CatalogApi`] looks up products and stock (`reqwest` in production)
//! - [`storage::KeyValueStore`] is the on-device key-value storage
//! - [`notify::Notifier`] receives the user-facing outcome of every operation
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartStore, FileStore, HttpCatalog, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let catalog = HttpCatalog::new(&config)?;
//! let storage = FileStore::new(&config.storage_dir);
//! let store = CartStore::load(catalog, storage, TracingNotifier).await;
//!
//! store.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use api::{ApiError, CatalogApi, HttpCatalog};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Operation};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use storage::{CART_STORAGE_KEY, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartStore, UpdateProductAmount};

pub use rocketshoes_core::{Cart, LineItem, Price, Product, ProductId, Stock};
