//! Integration test support for the RocketShoes cart.
//!
//! [`MockCatalog`] serves the catalog/stock REST API from an in-process
//! `axum` server on an ephemeral port, so tests can drive the real
//! `HttpCatalog` + `FileStore` stack end to end.
//!
//! # Example
//!
//! ```rust,ignore
//! let server = MockCatalog::new().with_product(&product, 5).spawn().await?;
//! let config = CartConfig::new(&server.base_url(), dir.path())?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use rocketshoes_core::Product;

/// Programmable catalog API.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    inner: Arc<Mutex<MockData>>,
}

#[derive(Debug, Default)]
struct MockData {
    products: HashMap<i32, Value>,
    stock: HashMap<i32, i32>,
    unavailable: bool,
    product_requests: usize,
    stock_requests: usize,
}

impl MockCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `product` with `stock` units available.
    #[must_use]
    pub fn with_product(self, product: &Product, stock: i32) -> Self {
        let id = product.product_id.as_i32();
        {
            let mut data = self.lock();
            data.products
                .insert(id, serde_json::to_value(product).unwrap_or_default());
            data.stock.insert(id, stock);
        }
        self
    }

    /// Serve an arbitrary body for `GET /products/{id}`.
    pub fn set_product_body(&self, id: i32, body: Value) {
        self.lock().products.insert(id, body);
    }

    pub fn set_stock(&self, id: i32, amount: i32) {
        self.lock().stock.insert(id, amount);
    }

    /// Make every endpoint answer 500.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.lock().product_requests
    }

    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.lock().stock_requests
    }

    /// Start serving on `127.0.0.1` with an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns error if the listener can't be bound.
    pub async fn spawn(self) -> std::io::Result<MockServer> {
        let app = Router::new()
            .route("/products/{id}", get(product))
            .route("/stock/{id}", get(stock))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(MockServer {
            addr,
            catalog: self,
            handle,
        })
    }

    fn lock(&self) -> MutexGuard<'_, MockData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Running mock server. Stops when dropped.
#[derive(Debug)]
pub struct MockServer {
    addr: SocketAddr,
    catalog: MockCatalog,
    handle: JoinHandle<()>,
}

impl MockServer {
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Handle for changing responses while the server runs.
    #[must_use]
    pub const fn catalog(&self) -> &MockCatalog {
        &self.catalog
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn product(State(catalog): State<MockCatalog>, Path(id): Path<i32>) -> Response {
    let mut data = catalog.lock();
    data.product_requests += 1;

    if data.unavailable {
        return (StatusCode::INTERNAL_SERVER_ERROR, "catalog unavailable").into_response();
    }
    match data.products.get(&id) {
        Some(body) => Json(body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn stock(State(catalog): State<MockCatalog>, Path(id): Path<i32>) -> Response {
    let mut data = catalog.lock();
    data.stock_requests += 1;

    if data.unavailable {
        return (StatusCode::INTERNAL_SERVER_ERROR, "stock unavailable").into_response();
    }
    match data.stock.get(&id) {
        Some(&amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}
