//! Checkout orchestration: cart validation, atomic order creation, and
//! payment dispatch.

use std::sync::Arc;

use common::{OrderId, UserId};
use domain::{Cart, NewOrder, NewOrderItem, Order, Product, ShippingInfo};
use store::{CheckoutStore, StoreError};

use crate::error::{CheckoutError, StockShortage};
use crate::providers::{MethodInfo, ProviderKind, ProviderSession};
use crate::registry::ProviderRegistry;

/// Drives a checkout attempt through its states:
/// building (the cart) → validating → committing → dispatched to a payment
/// provider. Validation and commit failures abort back to the checkout form
/// with nothing persisted.
pub struct CheckoutOrchestrator<S: CheckoutStore> {
    store: Arc<S>,
    registry: Arc<ProviderRegistry>,
}

impl<S: CheckoutStore> CheckoutOrchestrator<S> {
    /// Creates a new orchestrator over a store and the enabled providers.
    pub fn new(store: Arc<S>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    /// Creates an order from the session cart.
    ///
    /// Validates every line against live stock first and reports ALL
    /// violations together, then commits the order header, line items, and
    /// inventory decrements as one atomic unit. Prices are snapshotted from
    /// the live product records at this moment, not at add-to-cart time.
    /// The cart is cleared only after the order is durable.
    #[tracing::instrument(skip(self, cart, shipping))]
    pub async fn create_order(
        &self,
        cart: &mut Cart,
        shipping: ShippingInfo,
        user_id: UserId,
    ) -> Result<Order, CheckoutError> {
        metrics::counter!("checkout_attempts_total").increment(1);

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Validating: resolve every product and collect every violation, so
        // the user fixes the whole cart in one pass instead of line by line.
        let mut resolved: Vec<(Product, u32)> = Vec::with_capacity(cart.line_count());
        let mut shortages = Vec::new();
        for line in cart.lines() {
            let product = self
                .store
                .get_product(line.product_id)
                .await
                .map_err(CheckoutError::Storage)?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

            if !product.can_supply(line.quantity) {
                shortages.push(StockShortage {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            resolved.push((product, line.quantity));
        }
        if !shortages.is_empty() {
            metrics::counter!("checkout_stock_rejections_total").increment(1);
            return Err(CheckoutError::InsufficientStock(shortages));
        }

        // Committing: one atomic unit for header, items, and reservations.
        // A concurrent checkout can still win the race for the last units;
        // that surfaces as the same per-line error the validation phase
        // produces.
        let new_order = NewOrder {
            user_id,
            shipping,
            items: resolved
                .iter()
                .map(|(product, quantity)| NewOrderItem {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    quantity: *quantity,
                    unit_price: product.unit_price,
                })
                .collect(),
        };

        let order = match self.store.create_order(new_order).await {
            Ok(order) => order,
            Err(StoreError::InsufficientStock {
                product_id,
                available,
            }) => {
                metrics::counter!("checkout_stock_rejections_total").increment(1);
                let (product, quantity) = resolved
                    .iter()
                    .find(|(p, _)| p.id == product_id)
                    .map(|(p, q)| (p.name.clone(), *q))
                    .unwrap_or_default();
                return Err(CheckoutError::InsufficientStock(vec![StockShortage {
                    product_id,
                    product_name: product,
                    requested: quantity,
                    available,
                }]));
            }
            Err(err) => {
                tracing::error!(error = %err, "order creation failed");
                return Err(CheckoutError::Storage(err));
            }
        };

        cart.clear();
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            total_cents = order.total().cents(),
            items = order.items.len(),
            "order created"
        );

        Ok(order)
    }

    /// The enabled payment methods, or an operational error when the
    /// configuration enables none.
    pub fn payment_methods(&self) -> Result<Vec<MethodInfo>, CheckoutError> {
        if self.registry.is_empty() {
            return Err(CheckoutError::NoProvidersEnabled);
        }
        Ok(self.registry.methods())
    }

    /// Dispatches an unpaid order to the selected payment provider.
    ///
    /// When the provider issues a correlation id, it is persisted on the
    /// order before the session is returned, so a webhook can find the
    /// order even if the client never comes back.
    #[tracing::instrument(skip(self))]
    pub async fn start_payment(
        &self,
        order_id: OrderId,
        kind: ProviderKind,
        user_id: UserId,
    ) -> Result<ProviderSession, CheckoutError> {
        let order = self
            .store
            .get_order(order_id)
            .await
            .map_err(CheckoutError::Storage)?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !order.owned_by(user_id) {
            return Err(CheckoutError::Forbidden);
        }
        if order.paid {
            return Err(CheckoutError::AlreadyPaid);
        }
        if self.registry.is_empty() {
            return Err(CheckoutError::NoProvidersEnabled);
        }

        let provider = self
            .registry
            .get(kind)
            .ok_or(CheckoutError::ProviderUnavailable(kind))?;

        let session = provider.initiate(&order).await?;

        if let Some(correlation_id) = session.correlation_id() {
            self.store
                .set_payment_intent(order_id, correlation_id)
                .await
                .map_err(CheckoutError::Storage)?;
        }

        metrics::counter!("payments_initiated_total", "provider" => kind.as_str()).increment(1);
        Ok(session)
    }
}
