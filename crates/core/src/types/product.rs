//! Catalog and inventory records returned by the store API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by the catalog lookup.
///
/// Only `id` matters to the cart logic. The display fields are kept typed for
/// totals and rendering but default when absent, and anything else the
/// catalog sends is carried through `extra` untouched so it survives a
/// persist/reload cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with no extra catalog fields.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Price, image: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
            extra: Map::new(),
        }
    }
}

/// Available inventory for a product, as returned by the stock lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    /// Units available. May be zero or, for oversold items, negative.
    pub amount: i64,
}

impl Stock {
    /// Whether `requested` units can be satisfied by this record.
    #[must_use]
    pub fn covers(&self, requested: i64) -> bool {
        self.amount >= requested
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_keeps_unknown_catalog_fields() {
        let json = r#"{
            "id": 3,
            "title": "Tênis Adidas Duramo Lite 2.0",
            "price": 219.9,
            "image": "https://example.com/3.jpg",
            "brand": "adidas"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.price, Price::from_cents(21990));
        assert_eq!(product.extra.get("brand"), Some(&Value::from("adidas")));

        let back = serde_json::to_value(&product).unwrap();
        assert_eq!(back["brand"], "adidas");
    }

    #[test]
    fn test_product_display_fields_default_when_missing() {
        let product: Product = serde_json::from_str(r#"{"id": 2, "title": "B"}"#).unwrap();
        assert_eq!(product.id, ProductId::new(2));
        assert_eq!(product.title, "B");
        assert_eq!(product.price, Price::ZERO);
        assert!(product.image.is_empty());
        assert!(product.extra.is_empty());

        assert!(serde_json::from_str::<Product>(r#"{"title": "no id"}"#).is_err());
    }

    #[test]
    fn test_stock_covers() {
        let stock = Stock {
            id: ProductId::new(1),
            amount: 2,
        };
        assert!(stock.covers(1));
        assert!(stock.covers(2));
        assert!(!stock.covers(3));
    }
}
