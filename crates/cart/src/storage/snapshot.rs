//! Cart snapshot encoding.
//!
//! A snapshot is the JSON array of line items, each the catalog record with
//! its `amount` merged in:
//!
//! ```json
//! [{ "id": 1, "title": "Tênis", "price": 179.9, "image": "...", "amount": 2 }]
//! ```

use std::collections::HashSet;

use rocketshoes_core::CartItem;
use serde_json::Value;
use tracing::warn;

use super::{CartStorage, StorageError};

/// Serialize a cart collection.
///
/// # Errors
///
/// Returns `serde_json::Error` if an item cannot be serialized.
pub fn encode(items: &[CartItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Deserialize a cart collection.
///
/// Each entry is decoded on its own: an entry that is not a line item is
/// logged and skipped, and the rest are kept. Entries sharing a product id
/// are collapsed to the last one, which keeps the position of that last entry.
///
/// # Errors
///
/// Returns `serde_json::Error` if `raw` is not a JSON array.
pub fn decode(raw: &str) -> Result<Vec<CartItem>, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_str(raw)?;
    let items = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<CartItem>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable cart snapshot entry");
                None
            }
        })
        .collect();
    Ok(dedupe_keep_last(items))
}

fn dedupe_keep_last(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut kept: Vec<CartItem> = items
        .into_iter()
        .rev()
        .filter(|item| seen.insert(item.id()))
        .collect();
    kept.reverse();
    kept
}

/// Read the snapshot stored under `key`. A missing key is an empty cart.
///
/// # Errors
///
/// Returns `StorageError` if the slot cannot be read or decoded.
pub fn read(storage: &impl CartStorage, key: &str) -> Result<Vec<CartItem>, StorageError> {
    match storage.get_item(key)? {
        Some(raw) => Ok(decode(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Overwrite the snapshot stored under `key` with `items`.
///
/// # Errors
///
/// Returns `StorageError` if encoding or writing fails.
pub fn write(storage: &impl CartStorage, key: &str, items: &[CartItem]) -> Result<(), StorageError> {
    let raw = encode(items)?;
    storage.set_item(key, &raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocketshoes_core::{Price, Product, ProductId};

    use super::*;
    use crate::storage::MemoryStorage;

    fn item(id: i32, amount: u32) -> CartItem {
        CartItem::new(
            Product::new(
                ProductId::new(id),
                format!("Tênis {id}"),
                Price::from_cents(10_000 + i64::from(id)),
                format!("https://example.com/{id}.jpg"),
            ),
            amount,
        )
    }

    #[test]
    fn test_missing_slot_is_empty_cart() {
        let storage = MemoryStorage::new();
        assert!(read(&storage, "cart").unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let storage = MemoryStorage::new();
        let items = vec![item(1, 2), item(3, 1)];

        write(&storage, "cart", &items).unwrap();
        assert_eq!(read(&storage, "cart").unwrap(), items);
    }

    #[test]
    fn test_decode_collapses_duplicate_ids() {
        let raw = encode(&[item(1, 1), item(2, 1), item(1, 5)]).unwrap();
        let items = decode(&raw).unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id().as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(items[1].amount, 5);
    }

    #[test]
    fn test_decode_defaults_missing_display_fields() {
        let raw = r#"[
            {"id": 1, "title": "A", "price": 10, "image": "a", "amount": 2},
            {"id": 2, "title": "B", "price": 5, "amount": 1}
        ]"#;
        let items = decode(raw).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].amount, 2);
        assert_eq!(items[1].id(), ProductId::new(2));
        assert_eq!(items[1].product.price, Price::from_cents(500));
        assert!(items[1].product.image.is_empty());
    }

    #[test]
    fn test_decode_skips_unreadable_entries() {
        let raw = r#"[
            {"id": 1, "title": "A", "price": 10, "image": "a", "amount": 2},
            {"id": 2, "title": "B", "price": 5},
            "not an item",
            {"id": 3, "amount": -1},
            {"id": 4, "title": "D", "amount": 3}
        ]"#;
        let items = decode(raw).unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id().as_i32()).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(items[1].amount, 3);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("{not json").is_err());
        assert!(decode(r#"{"id": 1}"#).is_err());
    }
}
