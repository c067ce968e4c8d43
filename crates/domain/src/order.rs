//! Order aggregate: the durable record of one checkout attempt.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Delivery details captured on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

/// A line item with its unit price captured at order-creation time.
///
/// The price is historical: later changes to the product record never touch
/// it. The sum of line totals is the amount charged to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Soft reference to the product (which may change or disappear later).
    pub product_id: ProductId,
    /// Product name at order time.
    pub product_name: String,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price at order time.
    pub unit_price: Money,
}

impl OrderItem {
    /// Returns the total price for this item (quantity × unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The order header plus its line items.
///
/// Created atomically together with the inventory decrements. `paid` is
/// monotonic: once true it never transitions back, which is what makes
/// concurrent reconciliation deliveries safe to apply in any order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// The user the order belongs to.
    pub user_id: UserId,
    /// Delivery details.
    pub shipping: ShippingInfo,
    /// Whether a settlement has been verified for this order.
    pub paid: bool,
    /// Provider-assigned correlation id, set when payment is initiated.
    pub payment_intent_id: Option<String>,
    /// Provider settlement id, set when the payment is captured. One generic
    /// field regardless of which provider settled.
    pub provider_reference: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Line items with historical prices.
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Returns the amount to charge: the sum of all line totals.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Returns the total number of units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Returns true if `user` owns this order.
    pub fn owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }
}

/// Input to `CheckoutStore::create_order`: everything needed to persist the
/// order header, its items, and the matching inventory decrements in one
/// atomic unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shipping: ShippingInfo,
    pub items: Vec<NewOrderItem>,
}

/// One line of a `NewOrder` with the price already snapshotted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}
