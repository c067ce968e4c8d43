//! Catalog product.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog entry with its live price and available stock.
///
/// Stock never goes negative; it is only decremented through the store's
/// reservation step inside the order-creation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,

    /// Human-readable product name.
    pub name: String,

    /// Current unit price. Orders snapshot this at creation time.
    pub unit_price: Money,

    /// Units currently available for reservation.
    pub stock: u32,
}

impl Product {
    /// Creates a new product.
    pub fn new(name: impl Into<String>, unit_price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            unit_price,
            stock,
        }
    }

    /// Returns true if `quantity` units can be reserved right now.
    pub fn can_supply(&self, quantity: u32) -> bool {
        quantity <= self.stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_supply_respects_stock() {
        let product = Product::new("Mug", Money::from_cents(1299), 3);
        assert!(product.can_supply(3));
        assert!(!product.can_supply(4));
        assert!(product.can_supply(0));
    }

    #[test]
    fn serialization_roundtrip() {
        let product = Product::new("Mug", Money::from_cents(1299), 3);
        let json = serde_json::to_string(&product).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back, product);
    }
}
