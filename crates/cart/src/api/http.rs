//! `reqwest`-backed store API client.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{Product, ProductId, Stock};
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, StoreApi};
use crate::config::{StoreApiConfig, expose_token};

/// Store API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpStoreApi {
    inner: Arc<HttpStoreApiInner>,
}

struct HttpStoreApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStoreApi {
    /// Create a new store API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &StoreApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", expose_token(token)))
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpStoreApiInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Execute a GET request relative to the base URL.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return serde_json::from_str(&body).map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse store API response"
                );
                ApiError::Parse(format!("Failed to parse response: {e}"))
            });
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse error response from the store API.
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();

        // Check for rate limiting
        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            return ApiError::RateLimited(retry_after);
        }

        if status == 404 {
            return ApiError::NotFound(response.url().path().to_string());
        }

        let message = response
            .text()
            .await
            .map(|body| body.chars().take(200).collect::<String>())
            .unwrap_or_else(|_| "Unknown error".to_string());

        ApiError::Api { status, message }
    }
}

impl StoreApi for HttpStoreApi {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        let stock: Stock = self.get(&format!("stock/{id}")).await?;
        debug!(available = stock.amount, "Fetched stock");
        Ok(stock)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let product: Product = self.get(&format!("products/{id}")).await?;
        debug!(title = %product.title, "Fetched product");
        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_new_without_token() {
        let config = StoreApiConfig::new(Url::parse("http://localhost:3333/").unwrap());
        let api = HttpStoreApi::new(&config).unwrap();
        assert_eq!(api.base_url().as_str(), "http://localhost:3333/");
    }

    #[test]
    fn test_new_rejects_token_with_newline() {
        let config = StoreApiConfig {
            base_url: Url::parse("http://localhost:3333/").unwrap(),
            token: Some(SecretString::from("abc\ndef")),
        };
        assert!(matches!(HttpStoreApi::new(&config), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_request_paths_resolve_under_base() {
        let config = StoreApiConfig::new(Url::parse("http://localhost:3333/v1/").unwrap());
        let api = HttpStoreApi::new(&config).unwrap();
        let url = api.base_url().join(&format!("stock/{}", ProductId::new(9))).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/v1/stock/9");
    }
}
