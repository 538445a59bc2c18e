//! Key-value persistence slot for the cart snapshot.
//!
//! Mirrors browser local storage: string keys, string values, synchronous
//! reads and writes. The cart only ever touches one key ([`keys::CART`]) and
//! overwrites it wholesale on every mutation.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - in-process map, shared between clones
//! - [`FileStorage`] - one file per key in a directory, atomic replace on write

mod file;
mod memory;
pub mod snapshot;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Storage keys.
pub mod keys {
    /// Key holding the serialized cart collection.
    pub const CART: &str = "@RocketShoes:cart";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key cannot be stored by this backend.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// A synchronous string key-value store.
pub trait CartStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: CartStorage + ?Sized> CartStorage for std::sync::Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}
