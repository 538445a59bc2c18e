//! Cart line items.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// A product in the cart together with the requested quantity.
///
/// Serializes as the catalog record with an `amount` field merged in, which
/// is the shape of each entry in the persisted cart snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl CartItem {
    /// Create a line item for `product` with the given quantity.
    #[must_use]
    pub const fn new(product: Product, amount: u32) -> Self {
        Self { product, amount }
    }

    /// The product identifier, which is the line item's unique key.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.price * self.amount
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sneaker() -> Product {
        Product::new(
            ProductId::new(1),
            "Tênis de Caminhada Leve Confortável",
            Price::from_cents(17990),
            "https://example.com/1.jpg",
        )
    }

    #[test]
    fn test_cart_item_serializes_flat() {
        let item = CartItem::new(sneaker(), 2);
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["amount"], 2);
        assert_eq!(value["title"], "Tênis de Caminhada Leve Confortável");
        assert!(value.get("product").is_none());
    }

    #[test]
    fn test_cart_item_deserializes_with_extra_fields() {
        let value = json!({
            "id": 1,
            "title": "Tênis",
            "price": 179.9,
            "image": "https://example.com/1.jpg",
            "color": "black",
            "amount": 4
        });

        let item: CartItem = serde_json::from_value(value).unwrap();
        assert_eq!(item.amount, 4);
        assert_eq!(item.id(), ProductId::new(1));
        assert_eq!(item.product.extra.len(), 1);
        assert!(!item.product.extra.contains_key("amount"));
    }

    #[test]
    fn test_cart_item_subtotal() {
        let item = CartItem::new(sneaker(), 3);
        assert_eq!(item.subtotal(), Price::from_cents(53970));
    }
}
