//! Settlement reconciliation: webhook deliveries and synchronous claims
//! converge on one idempotent apply step.

use std::sync::Arc;

use common::UserId;
use domain::Order;
use store::CheckoutStore;

use crate::error::ReconcileError;
use crate::notify::NotificationService;
use crate::providers::{ProviderKind, SettlementClaim, WebhookNotification};
use crate::registry::ProviderRegistry;

/// What a reconciliation attempt did to the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// This delivery won: the order is now paid and the settlement id is
    /// stored.
    Updated { order_id: common::OrderId },
    /// The order was already paid — a redelivered webhook or the losing
    /// side of the verify/webhook race. Not an error, no side effects.
    AlreadyPaid { order_id: common::OrderId },
    /// Authentic but irrelevant event type; nothing to do.
    Ignored,
    /// No order carries the correlation id. Logged; the webhook entry point
    /// still acknowledges the delivery so the provider stops retrying.
    OrderNotFound { correlation_id: String },
}

/// Applies verified provider notifications to order state.
///
/// Safe under concurrent delivery of the same settlement through both entry
/// points: the store's conditional `mark_paid` update decides the single
/// winner, not any lock held here.
pub struct Reconciler<S: CheckoutStore, N: NotificationService> {
    store: Arc<S>,
    registry: Arc<ProviderRegistry>,
    notifier: N,
}

impl<S: CheckoutStore, N: NotificationService> Reconciler<S, N> {
    /// Creates a new reconciler.
    pub fn new(store: Arc<S>, registry: Arc<ProviderRegistry>, notifier: N) -> Self {
        Self {
            store,
            registry,
            notifier,
        }
    }

    /// Handles an asynchronous provider webhook.
    ///
    /// The signature is recomputed from the RAW payload bytes before any
    /// field is trusted; mismatches reject with no state change. Deliveries
    /// for providers that are not enabled are acknowledged as no-ops (the
    /// provider is misdirected, retrying will not help it).
    #[tracing::instrument(skip(self, payload, signature_header))]
    pub async fn reconcile_webhook(
        &self,
        kind: ProviderKind,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        metrics::counter!("webhooks_received_total", "provider" => kind.as_str()).increment(1);

        let Some(provider) = self.registry.get(kind) else {
            tracing::warn!("webhook for disabled provider, acknowledging as no-op");
            return Ok(ReconcileOutcome::Ignored);
        };

        let notification = provider
            .verify_webhook(payload, signature_header)
            .map_err(|err| {
                tracing::warn!(error = %err, "webhook verification failed");
                metrics::counter!("webhook_rejections_total", "provider" => kind.as_str())
                    .increment(1);
                ReconcileError::Verification(err)
            })?;

        match notification {
            WebhookNotification::Ignored { event } => {
                tracing::debug!(%event, "ignoring non-capture event");
                Ok(ReconcileOutcome::Ignored)
            }
            WebhookNotification::Captured {
                correlation_id,
                settlement_id,
            } => {
                self.apply_settlement(&correlation_id, &settlement_id, None)
                    .await
            }
        }
    }

    /// Handles the synchronous "verify now" call a client makes right after
    /// the provider SDK reports success.
    ///
    /// Unlike the webhook path this is made on behalf of a user, so the
    /// order must belong to them; and an unknown correlation id is an error
    /// the caller sees.
    #[tracing::instrument(skip(self, claim))]
    pub async fn verify_settlement(
        &self,
        kind: ProviderKind,
        claim: &SettlementClaim,
        user_id: UserId,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let provider = self
            .registry
            .get(kind)
            .ok_or(ReconcileError::ProviderUnavailable(kind))?;

        let settlement = provider.verify_settlement(claim).map_err(|err| {
            tracing::warn!(error = %err, "settlement claim verification failed");
            ReconcileError::Verification(err)
        })?;

        match self
            .apply_settlement(&settlement.correlation_id, &settlement.settlement_id, Some(user_id))
            .await?
        {
            ReconcileOutcome::OrderNotFound { correlation_id } => {
                Err(ReconcileError::OrderNotFound(correlation_id))
            }
            outcome => Ok(outcome),
        }
    }

    /// The single apply step both entry points converge on.
    ///
    /// Idempotent: the conditional `mark_paid` update lets exactly one
    /// delivery flip the flag; every other delivery (concurrent or
    /// redelivered) observes `AlreadyPaid` and triggers no side effects.
    async fn apply_settlement(
        &self,
        correlation_id: &str,
        settlement_id: &str,
        requesting_user: Option<UserId>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let Some(order) = self.store.find_order_by_intent(correlation_id).await? else {
            tracing::error!(%correlation_id, "no order matches settlement correlation id");
            metrics::counter!("settlements_unmatched_total").increment(1);
            return Ok(ReconcileOutcome::OrderNotFound {
                correlation_id: correlation_id.to_string(),
            });
        };

        if let Some(user_id) = requesting_user
            && !order.owned_by(user_id)
        {
            return Err(ReconcileError::Forbidden);
        }

        let won = self.store.mark_paid(order.id, settlement_id).await?;
        if !won {
            tracing::info!(order_id = %order.id, "duplicate settlement delivery, no-op");
            return Ok(ReconcileOutcome::AlreadyPaid { order_id: order.id });
        }

        metrics::counter!("payments_settled_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            %settlement_id,
            "payment settled"
        );

        self.notify_paid(&order).await;
        Ok(ReconcileOutcome::Updated { order_id: order.id })
    }

    /// Fire-and-forget confirmation; failures never affect reconciliation.
    async fn notify_paid(&self, order: &Order) {
        if let Err(err) = self.notifier.send_payment_confirmation(order).await {
            tracing::warn!(order_id = %order.id, error = %err, "payment confirmation failed");
        }
    }
}
