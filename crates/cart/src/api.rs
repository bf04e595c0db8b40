//! Catalog and stock API client.
//!
//! The catalog is a plain JSON REST API:
//! - `GET /products/{id}` - product attributes (no quantity)
//! - `GET /stock/{id}` - `{ "id": .., "amount": .. }`
//!
//! [`CatalogApi`] is the seam the cart store depends on; [`HttpCatalog`] is
//! the `reqwest` implementation used in production.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use rocketshoes_core::{Product, ProductId, Stock};

use crate::config::CartConfig;

/// Maximum number of response-body characters kept in logs and errors.
const MAX_LOGGED_BODY: usize = 500;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Product and stock lookups the cart depends on.
pub trait CatalogApi: Send + Sync {
    /// Look up a product. `Ok(None)` means the catalog has no data for it.
    fn product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, ApiError>> + Send;

    /// Look up the currently available stock for a product.
    fn stock(&self, product_id: ProductId) -> impl Future<Output = Result<Stock, ApiError>> + Send;
}

/// `reqwest`-backed catalog client.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalog {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CartConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_url.clone(),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET a JSON document. `Ok(None)` for 404, an empty body, `null` or `{}`.
    async fn get_json(&self, path: &str) -> Result<Option<Value>, ApiError> {
        let url = self.base_url.join(path)?;
        debug!(%url, "GET");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message: String = body.chars().take(MAX_LOGGED_BODY).collect();
            tracing::error!(
                status = %status,
                body = %message,
                "Catalog API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(MAX_LOGGED_BODY).collect::<String>(),
                "Failed to parse catalog API response"
            );
            e
        })?;

        Ok(Some(value).filter(|v| !is_empty_document(v)))
    }
}

impl CatalogApi for HttpCatalog {
    #[instrument(skip(self))]
    async fn product(&self, product_id: ProductId) -> Result<Option<Product>, ApiError> {
        let Some(value) = self.get_json(&format!("products/{product_id}")).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    #[instrument(skip(self))]
    async fn stock(&self, product_id: ProductId) -> Result<Stock, ApiError> {
        let value = self
            .get_json(&format!("stock/{product_id}"))
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("stock for product {product_id}")))?;
        Ok(serde_json::from_value(value)?)
    }
}

/// `null` and `{}` carry no data.
fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");

        let err = ApiError::NotFound("stock for product 3".to_string());
        assert_eq!(err.to_string(), "Not found: stock for product 3");
    }

    #[test]
    fn test_is_empty_document() {
        assert!(is_empty_document(&Value::Null));
        assert!(is_empty_document(&serde_json::json!({})));
        assert!(!is_empty_document(&serde_json::json!({"id": 1})));
        assert!(!is_empty_document(&serde_json::json!([])));
    }

    #[test]
    fn test_request_urls_keep_base_path() {
        let config = CartConfig::new("http://localhost:3333/api", "/tmp").unwrap();
        let catalog = HttpCatalog::new(&config).unwrap();
        assert_eq!(
            catalog.base_url().join("products/4").unwrap().as_str(),
            "http://localhost:3333/api/products/4"
        );
    }
}
