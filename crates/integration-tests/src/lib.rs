//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! No external services are needed: [`FakeStoreServer`] serves the stock and
//! catalog endpoints from memory on an ephemeral local port.
//!
//! # Test Categories
//!
//! - `store_api` - HTTP client behavior against the fake server
//! - `cart_session` - Cart operations end to end with a file-backed slot

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocketshoes_core::{Price, Product, ProductId, Stock};
use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;

/// Canned response for the next request to an endpoint.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Respond with this status and a plain-text body.
    Status(u16),
    /// Respond 200 with a body that is not valid JSON.
    Garbage,
}

#[derive(Default)]
struct Inventory {
    stock: HashMap<i32, i64>,
    products: HashMap<i32, Value>,
    failure: Option<Failure>,
    token: Option<String>,
    hits: Vec<String>,
}

#[derive(Clone, Default)]
struct FakeState {
    inner: Arc<Mutex<Inventory>>,
}

impl FakeState {
    fn with<R>(&self, f: impl FnOnce(&mut Inventory) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

/// In-memory store API served over HTTP.
pub struct FakeStoreServer {
    state: FakeState,
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl FakeStoreServer {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake store API");
        let addr = listener.local_addr().expect("Listener has no address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            state,
            addr,
            handle,
        }
    }

    /// Base URL of the server, with trailing slash.
    ///
    /// # Panics
    ///
    /// Panics if the address does not form a URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("Invalid fake server URL")
    }

    /// Set available stock for a product.
    pub fn set_stock(&self, id: i32, amount: i64) {
        self.state.with(|inv| inv.stock.insert(id, amount));
    }

    /// Register a catalog record built from typed fields.
    pub fn add_product(&self, id: i32, title: &str, price: Price) {
        let product = Product::new(
            ProductId::new(id),
            title,
            price,
            format!("https://rocketseat.test/images/{id}.jpg"),
        );
        let value = serde_json::to_value(product).unwrap_or(Value::Null);
        self.add_raw_product(id, value);
    }

    /// Register a catalog record exactly as it should be served.
    pub fn add_raw_product(&self, id: i32, value: Value) {
        self.state.with(|inv| inv.products.insert(id, value));
    }

    /// Make the next request fail with `failure`.
    pub fn fail_next(&self, failure: Failure) {
        self.state.with(|inv| inv.failure = Some(failure));
    }

    /// Require `Authorization: Bearer {token}` on every request.
    pub fn require_token(&self, token: &str) {
        self.state.with(|inv| inv.token = Some(token.to_string()));
    }

    /// Paths requested so far, in order.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        self.state.with(|inv| inv.hits.clone())
    }
}

impl Drop for FakeStoreServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Common request bookkeeping: record the hit, check auth, apply failures.
fn precheck(state: &FakeState, headers: &HeaderMap, path: String) -> Option<Response> {
    state.with(|inv| {
        inv.hits.push(path);

        if let Some(token) = &inv.token {
            let expected = format!("Bearer {token}");
            let given = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if given != Some(expected.as_str()) {
                return Some((StatusCode::UNAUTHORIZED, "missing token").into_response());
            }
        }

        match inv.failure.take() {
            Some(Failure::Status(code)) => {
                let status =
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let mut response = (status, "injected failure").into_response();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, header::HeaderValue::from_static("7"));
                }
                Some(response)
            }
            Some(Failure::Garbage) => Some((StatusCode::OK, "{not json").into_response()),
            None => None,
        }
    })
}

async fn stock(State(state): State<FakeState>, headers: HeaderMap, Path(id): Path<i32>) -> Response {
    if let Some(response) = precheck(&state, &headers, format!("/stock/{id}")) {
        return response;
    }

    match state.with(|inv| inv.stock.get(&id).copied()) {
        Some(amount) => Json(Stock {
            id: ProductId::new(id),
            amount,
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    if let Some(response) = precheck(&state, &headers, format!("/products/{id}")) {
        return response;
    }

    match state.with(|inv| inv.products.get(&id).cloned()) {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
