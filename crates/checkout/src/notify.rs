//! Payment-confirmation notification collaborator.
//!
//! Fire-and-forget from the reconciler's perspective: failures are logged
//! and never change the reconciliation result.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use thiserror::Error;

/// A notification delivery failure.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Trait for the payment-confirmation notification channel.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Notifies the customer that their payment was captured.
    async fn send_payment_confirmation(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Notifier that only logs. Used when no delivery channel is wired up.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates the logging notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationService for LogNotifier {
    async fn send_payment_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            email = %order.shipping.email,
            "payment confirmation queued"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct NotifierState {
    sent: Vec<OrderId>,
    fail_on_send: bool,
}

/// In-memory notifier for tests: records every confirmation it was asked to
/// send and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<NotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail deliveries.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the orders a confirmation was sent for, in order.
    pub fn sent(&self) -> Vec<OrderId> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotifier {
    async fn send_payment_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(NotifyError("delivery channel down".to_string()));
        }
        state.sent.push(order.id);
        Ok(())
    }
}
