//! Session-owned shopping cart snapshot.
//!
//! A cart is ephemeral: it lives with the session, carries no prices (prices
//! resolve from the live product at checkout, not at add-to-cart time), and
//! is cleared wholesale when an order is created from it.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::product::Product;

/// One cart entry: a product reference and a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line refers to.
    pub product_id: ProductId,
    /// Units requested. Always positive.
    pub quantity: u32,
}

/// How `upsert_line` treats a product already present in the cart.
///
/// The caller states its intent explicitly instead of the cart inferring it
/// from membership: product pages add, cart-page quantity edits replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertMode {
    /// Add the quantity to any existing line.
    Add,
    /// Replace the existing line's quantity.
    Replace,
}

/// A cart line priced against the live catalog at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    /// The product being bought.
    pub product_id: ProductId,
    /// Product name at pricing time.
    pub product_name: String,
    /// Units requested.
    pub quantity: u32,
    /// Live unit price at pricing time.
    pub unit_price: Money,
}

impl PricedLine {
    /// Prices a cart line against a product record.
    pub fn price(line: CartLine, product: &Product) -> Self {
        Self {
            product_id: line.product_id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.unit_price,
        }
    }

    /// Returns quantity × unit price.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The session cart: an ordered list of lines, one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Iterates over the cart lines in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Returns the line for a product, if present.
    pub fn get_line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Inserts or updates the line for `product_id`.
    ///
    /// `mode` decides what happens when the product is already in the cart:
    /// `Add` accumulates quantities, `Replace` overwrites the quantity.
    pub fn upsert_line(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        mode: UpsertMode,
    ) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = match mode {
                    UpsertMode::Add => line.quantity.saturating_add(quantity),
                    UpsertMode::Replace => quantity,
                };
                Ok(line.quantity)
            }
            None => {
                self.lines.push(CartLine {
                    product_id,
                    quantity,
                });
                Ok(quantity)
            }
        }
    }

    /// Removes the line for a product. Unknown products are an error so the
    /// caller can tell the user the cart did not change.
    pub fn remove_line(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound { product_id });
        }
        Ok(())
    }

    /// Empties the cart. Called after the order is durably created.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
