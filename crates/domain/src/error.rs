//! Domain error types.

use common::ProductId;
use thiserror::Error;

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be positive.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The product is not in the cart.
    #[error("product {product_id} is not in the cart")]
    LineNotFound { product_id: ProductId },
}
