//! RocketShoes Cart library.
//!
//! Client-side shopping-cart state: add, remove and re-quantify line items,
//! validate quantities against the store's stock endpoint, and mirror the
//! collection into a local key-value slot.
//!
//! # Modules
//!
//! - [`cart`] - The [`CartStore`] state container and its three operations
//! - [`api`] - Stock and catalog lookups ([`StoreApi`], [`HttpStoreApi`])
//! - [`storage`] - The persistence slot ([`CartStorage`]) and snapshot format
//! - [`notify`] - Transient user-facing notices
//! - [`config`] - Environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartStore, FileStorage, HttpStoreApi};
//!
//! let config = CartConfig::from_env()?;
//! let api = HttpStoreApi::new(&config.api)?;
//! let store = CartStore::new(api, FileStorage::new(&config.storage_dir));
//!
//! store.add_product(ProductId::new(1)).await;
//! println!("{} items, {}", store.size(), store.total());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod notify;
pub mod storage;

pub use api::{ApiError, HttpStoreApi, StoreApi};
pub use cart::{CartError, CartStore, Outcome};
pub use config::{CartConfig, ConfigError, StoreApiConfig};
pub use notify::{Notice, Notifier};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
