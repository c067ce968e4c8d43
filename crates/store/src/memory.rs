use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId};
use domain::{NewOrder, Order, OrderItem, Product};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::CheckoutStore,
};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory checkout store.
///
/// Products and orders live behind a single lock so that order creation
/// observes and mutates stock atomically, mirroring the transactional
/// behavior of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock for a product, if it exists.
    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.state.read().await.products.get(&id).map(|p| p.stock)
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        self.state.write().await.products.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;

        // Validate every line before mutating anything, so a shortage on the
        // last line leaves the earlier lines' stock untouched.
        for item in &new_order.items {
            let product = state
                .products
                .get(&item.product_id)
                .ok_or(StoreError::ProductNotFound(item.product_id))?;
            if product.stock < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                    available: product.stock,
                });
            }
        }

        for item in &new_order.items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.stock -= item.quantity;
            }
        }

        let order = Order {
            id: OrderId::new(),
            user_id: new_order.user_id,
            shipping: new_order.shipping,
            paid: false,
            payment_intent_id: None,
            provider_reference: None,
            created_at: Utc::now(),
            items: new_order
                .items
                .into_iter()
                .map(|i| OrderItem {
                    product_id: i.product_id,
                    product_name: i.product_name,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
        };
        state.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn find_order_by_intent(&self, intent: &str) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.payment_intent_id.as_deref() == Some(intent))
            .cloned())
    }

    async fn set_payment_intent(&self, id: OrderId, intent: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(&id).ok_or(StoreError::OrderNotFound(id))?;
        order.payment_intent_id = Some(intent.to_string());
        Ok(())
    }

    async fn mark_paid(&self, id: OrderId, provider_reference: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(&id).ok_or(StoreError::OrderNotFound(id))?;

        if order.paid {
            return Ok(false);
        }
        order.paid = true;
        order.provider_reference = Some(provider_reference.to_string());
        Ok(true)
    }
}
