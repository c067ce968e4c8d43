use async_trait::async_trait;
use common::{OrderId, ProductId};
use domain::{NewOrder, Order, Product};

use crate::Result;

/// Core trait for checkout persistence.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Inserts a product into the catalog. Used by seeding and tests; the
    /// storefront catalog itself is managed elsewhere.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Retrieves a product with its live price and stock.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists the catalog.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Creates an order atomically.
    ///
    /// In ONE atomic unit this inserts the order header, inserts every line
    /// item, and reserves stock for each line (checking
    /// `available >= quantity` and decrementing). Any shortage aborts the
    /// whole unit with `StoreError::InsufficientStock` carrying the
    /// available quantity — no order row, item row, or stock mutation
    /// persists. This is the checkout's only hard concurrency guarantee:
    /// concurrent checkouts competing for the same limited stock serialize
    /// through the conditional decrement.
    async fn create_order(&self, new_order: NewOrder) -> Result<Order>;

    /// Retrieves an order with its items.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Looks up the order whose payment correlation id matches `intent`.
    async fn find_order_by_intent(&self, intent: &str) -> Result<Option<Order>>;

    /// Persists the provider-assigned correlation id on an order at payment
    /// initiation time.
    async fn set_payment_intent(&self, id: OrderId, intent: &str) -> Result<()>;

    /// Applies a verified settlement: sets `paid = true` and stores the
    /// provider reference, but only if the order is still unpaid
    /// (`UPDATE ... WHERE paid = FALSE` discipline).
    ///
    /// Returns `true` iff this call performed the transition. A `false`
    /// return means another delivery won the race — callers treat it as a
    /// duplicate and skip side effects. `paid` is monotonic: no path ever
    /// sets it back to false.
    async fn mark_paid(&self, id: OrderId, provider_reference: &str) -> Result<bool>;
}
