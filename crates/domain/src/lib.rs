//! Domain layer for the storefront.
//!
//! This crate provides the data model the checkout core operates on:
//! - `Product`: catalog entry with live price and stock
//! - `Cart`/`CartLine`: the ephemeral, session-owned checkout snapshot
//! - `Order`/`OrderItem`: the durable record of a checkout attempt
//! - `ShippingInfo`: the delivery fields captured at order creation

pub mod cart;
pub mod error;
pub mod order;
pub mod product;

pub use cart::{Cart, CartLine, PricedLine, UpsertMode};
pub use common::{Money, OrderId, ProductId, UserId};
pub use error::CartError;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, ShippingInfo};
pub use product::Product;
