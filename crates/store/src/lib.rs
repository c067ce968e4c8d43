//! Persistence layer for the storefront checkout.
//!
//! The central contract is [`CheckoutStore`]: order creation reserves
//! inventory and writes the order header and line items as one atomic unit,
//! and settlement application is a conditional update that can only flip
//! `paid` from false to true once.
//!
//! Two implementations are provided: [`InMemoryStore`] for tests and
//! dependency-free runs, and [`PostgresStore`] backed by `sqlx`.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{OrderId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::CheckoutStore;
