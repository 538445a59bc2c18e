//! Store API used by the cart: stock and catalog lookups.
//!
//! # Endpoints
//!
//! - `GET {base}/stock/{id}` - `{ "id": 1, "amount": 5 }`
//! - `GET {base}/products/{id}` - the full catalog record for the product
//!
//! Both lookups are read-only and uncached: stock is re-read for every
//! quantity check so the cart never validates against a stale value.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::api::{HttpStoreApi, StoreApi};
//!
//! let api = HttpStoreApi::new(&config.api)?;
//! let stock = api.stock(ProductId::new(1)).await?;
//! ```

mod http;

pub use http::HttpStoreApi;

use std::future::Future;

use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when talking to the store API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the store API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read-only lookups the cart performs before committing a change.
///
/// Implemented over HTTP by [`HttpStoreApi`]; tests provide in-memory fakes.
pub trait StoreApi: Send + Sync {
    /// Fetch the current stock record for a product.
    fn stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, ApiError>> + Send;

    /// Fetch the catalog record for a product.
    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send;
}

impl<T: StoreApi> StoreApi for std::sync::Arc<T> {
    fn stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, ApiError>> + Send {
        (**self).stock(id)
    }

    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send {
        (**self).product(id)
    }
}
