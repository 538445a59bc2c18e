//! Cart state container.
//!
//! [`CartStore`] owns the line-item collection for one session. It is
//! hydrated once from the storage slot, and every successful mutation writes
//! the full collection back to the slot before publishing it to observers.
//!
//! # Operations
//!
//! | Operation | Lookups | Failure notice |
//! |-----------|---------|----------------|
//! | [`CartStore::add_product`] | stock, catalog | `OutOfStock` / `AddFailed` |
//! | [`CartStore::remove_product`] | none | `RemoveFailed` |
//! | [`CartStore::update_product_amount`] | stock | `OutOfStock` / `UpdateFailed` |
//!
//! Each operation works on the collection as it was when the call started
//! and replaces it wholesale when it commits. Two calls in flight at once
//! are not serialized: the one that commits last wins.

use rocketshoes_core::{CartItem, Price, ProductId};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, StoreApi};
use crate::notify::{Notice, Notifier};
use crate::storage::{CartStorage, StorageError, keys, snapshot};

/// Why a cart operation did not apply.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds available stock.
    #[error("Product {id}: requested {requested}, only {available} in stock")]
    OutOfStock {
        id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Catalog answered with a different product than requested.
    #[error("Catalog returned product {returned} for product {requested}")]
    CatalogMismatch {
        requested: ProductId,
        returned: ProductId,
    },

    /// Quantity does not fit a line item.
    #[error("Quantity {0} is out of range")]
    QuantityOutOfRange(i64),

    /// Store API lookup failed.
    #[error("Store API error: {0}")]
    Api(#[from] ApiError),

    /// Persisting the snapshot failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result of a cart operation, for callers that want to know what happened.
///
/// Failures have already been published as notices; this value is purely
/// informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The cart changed and was persisted.
    Applied,
    /// The request was a no-op by definition (e.g. a non-positive quantity).
    Ignored,
    /// The cart was left unchanged and this notice was published.
    Rejected(Notice),
}

impl Outcome {
    /// Whether the cart changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    const fn notice_for(self, err: &CartError) -> Notice {
        match (err, self) {
            (CartError::OutOfStock { .. }, _) => Notice::OutOfStock,
            (_, Self::Add) => Notice::AddFailed,
            (_, Self::Remove) => Notice::RemoveFailed,
            (_, Self::Update) => Notice::UpdateFailed,
        }
    }
}

/// Cart state for one session.
pub struct CartStore<A, S> {
    api: A,
    storage: S,
    notifier: Notifier,
    key: String,
    state: watch::Sender<Vec<CartItem>>,
}

impl<A: StoreApi, S: CartStorage> CartStore<A, S> {
    /// Create a store hydrated from the default slot with a fresh notifier.
    pub fn new(api: A, storage: S) -> Self {
        Self::with_notifier(api, storage, Notifier::new())
    }

    /// Create a store hydrated from the default slot, publishing on `notifier`.
    pub fn with_notifier(api: A, storage: S, notifier: Notifier) -> Self {
        Self::with_key(api, storage, notifier, keys::CART)
    }

    /// Create a store hydrated from the slot named `key`.
    ///
    /// A missing slot starts an empty cart. An unreadable or malformed slot
    /// is logged and also starts an empty cart; it is overwritten by the
    /// next successful mutation.
    pub fn with_key(api: A, storage: S, notifier: Notifier, key: impl Into<String>) -> Self {
        let key = key.into();
        let items = snapshot::read(&storage, &key).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Discarding unreadable cart snapshot");
            Vec::new()
        });
        debug!(key = %key, items = items.len(), "Cart hydrated");

        let (state, _) = watch::channel(items);

        Self {
            api,
            storage,
            notifier,
            key,
            state,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current line items.
    #[must_use]
    pub fn cart(&self) -> Vec<CartItem> {
        self.state.borrow().clone()
    }

    /// Observe the line items; the receiver sees every committed collection.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.state.subscribe()
    }

    /// Receive notices published from now on.
    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    /// Quantity of `id` in the cart, if present.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> Option<u32> {
        self.state
            .borrow()
            .iter()
            .find(|item| item.id() == id)
            .map(|item| item.amount)
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn size(&self) -> usize {
        self.state.borrow().len()
    }

    /// Sum of every line item's subtotal.
    #[must_use]
    pub fn total(&self) -> Price {
        self.state.borrow().iter().map(CartItem::subtotal).sum()
    }

    /// The storage slot key this cart persists to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The storage backend.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add one unit of a product.
    ///
    /// The new quantity is the current one plus one (or one if absent). It is
    /// checked against stock, then the catalog record is fetched and stored
    /// under that quantity at the end of the cart, replacing any earlier
    /// entry for the product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_product(&self, id: ProductId) -> Outcome {
        let result = self.try_add(id).await;
        self.settle(Operation::Add, result)
    }

    /// Remove a product from the cart.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_product(&self, id: ProductId) -> Outcome {
        let result = self.try_remove(id);
        self.settle(Operation::Remove, result)
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// Zero or negative amounts are ignored without a notice. Stock is checked
    /// before cart membership, so an absent product with short stock reports
    /// `OutOfStock` rather than `UpdateFailed`.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_amount(&self, id: ProductId, amount: i64) -> Outcome {
        if amount <= 0 {
            debug!(amount, "Ignoring non-positive quantity");
            return Outcome::Ignored;
        }

        let result = self.try_update(id, amount).await;
        self.settle(Operation::Update, result)
    }

    async fn try_add(&self, id: ProductId) -> Result<(), CartError> {
        let cart = self.cart();
        let desired = cart
            .iter()
            .find(|item| item.id() == id)
            .map_or(Ok(1), |item| {
                item.amount
                    .checked_add(1)
                    .ok_or(CartError::QuantityOutOfRange(i64::from(item.amount) + 1))
            })?;

        let stock = self.api.stock(id).await?;
        if !stock.covers(i64::from(desired)) {
            return Err(CartError::OutOfStock {
                id,
                requested: i64::from(desired),
                available: stock.amount,
            });
        }

        let product = self.api.product(id).await?;
        if product.id != id {
            return Err(CartError::CatalogMismatch {
                requested: id,
                returned: product.id,
            });
        }

        let mut next: Vec<CartItem> = cart.into_iter().filter(|item| item.id() != id).collect();
        next.push(CartItem::new(product, desired));

        self.commit(next)
    }

    fn try_remove(&self, id: ProductId) -> Result<(), CartError> {
        let cart = self.cart();
        if !cart.iter().any(|item| item.id() == id) {
            return Err(CartError::NotInCart(id));
        }

        let next = cart.into_iter().filter(|item| item.id() != id).collect();
        self.commit(next)
    }

    async fn try_update(&self, id: ProductId, amount: i64) -> Result<(), CartError> {
        let cart = self.cart();

        let stock = self.api.stock(id).await?;
        if !stock.covers(amount) {
            return Err(CartError::OutOfStock {
                id,
                requested: amount,
                available: stock.amount,
            });
        }

        if !cart.iter().any(|item| item.id() == id) {
            return Err(CartError::NotInCart(id));
        }

        let amount = u32::try_from(amount).map_err(|_| CartError::QuantityOutOfRange(amount))?;
        let next = cart
            .into_iter()
            .map(|mut item| {
                if item.id() == id {
                    item.amount = amount;
                }
                item
            })
            .collect();

        self.commit(next)
    }

    /// Persist `next`, then publish it. Nothing is published if the write fails.
    fn commit(&self, next: Vec<CartItem>) -> Result<(), CartError> {
        snapshot::write(&self.storage, &self.key, &next)?;
        debug!(items = next.len(), "Cart committed");
        self.state.send_replace(next);
        Ok(())
    }

    fn settle(&self, op: Operation, result: Result<(), CartError>) -> Outcome {
        match result {
            Ok(()) => Outcome::Applied,
            Err(err) => {
                let notice = op.notice_for(&err);
                match &err {
                    CartError::OutOfStock { .. } | CartError::NotInCart(_) => {
                        debug!(operation = ?op, error = %err, "Cart operation rejected");
                    }
                    _ => warn!(operation = ?op, error = %err, "Cart operation failed"),
                }
                self.notifier.notify(notice);
                Outcome::Rejected(notice)
            }
        }
    }
}
