//! In-memory provider for tests: gateway-shaped behavior without a network.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use serde::Deserialize;

use crate::error::{ProviderError, VerificationError};

use super::signature::{hmac_sha256_hex, verify_hmac_sha256_hex};
use super::{
    MethodInfo, PaymentProvider, ProviderKind, ProviderSession, Settlement, SettlementClaim,
    WebhookNotification,
};

#[derive(Debug, Default)]
struct MockState {
    initiations: Vec<OrderId>,
    next_id: u32,
    fail_on_initiate: bool,
}

/// Gateway test double.
///
/// Issues deterministic correlation ids, records which orders were
/// initiated, and verifies notifications with the same HMAC scheme as the
/// real gateways so reconciliation tests exercise the full signature path.
#[derive(Debug, Clone)]
pub struct MockProvider {
    kind: ProviderKind,
    secret: String,
    state: Arc<RwLock<MockState>>,
}

#[derive(Debug, Deserialize)]
struct MockWebhookEvent {
    event: String,
    correlation_id: Option<String>,
    settlement_id: Option<String>,
}

impl MockProvider {
    /// Creates a mock provider registered under `kind`, verifying inbound
    /// notifications with `secret`.
    pub fn new(kind: ProviderKind, secret: impl Into<String>) -> Self {
        Self {
            kind,
            secret: secret.into(),
            state: Arc::new(RwLock::new(MockState::default())),
        }
    }

    /// Configures the provider to fail the next initiation.
    pub fn set_fail_on_initiate(&self, fail: bool) {
        self.state.write().unwrap().fail_on_initiate = fail;
    }

    /// Returns the orders whose payment was initiated, in order.
    pub fn initiated_orders(&self) -> Vec<OrderId> {
        self.state.read().unwrap().initiations.clone()
    }

    /// Signs a webhook payload the way this provider expects, for driving
    /// the verification path from tests.
    pub fn sign_payload(&self, payload: &[u8]) -> String {
        hmac_sha256_hex(self.secret.as_bytes(), payload)
    }

    /// Signs a settlement claim for `(order, payment)`.
    pub fn sign_claim(&self, provider_order_id: &str, provider_payment_id: &str) -> String {
        let message = format!("{provider_order_id}|{provider_payment_id}");
        hmac_sha256_hex(self.secret.as_bytes(), message.as_bytes())
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn describe(&self) -> MethodInfo {
        MethodInfo {
            kind: self.kind,
            name: "Mock Gateway",
            description: "Deterministic gateway for tests".to_string(),
        }
    }

    async fn initiate(&self, order: &Order) -> Result<ProviderSession, ProviderError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_initiate {
            return Err(ProviderError::UnexpectedResponse(
                "mock gateway configured to fail".to_string(),
            ));
        }

        state.next_id += 1;
        state.initiations.push(order.id);
        Ok(ProviderSession::ClientSession {
            correlation_id: format!("mock_intent_{:04}", state.next_id),
            client_payload: serde_json::json!({ "amount": order.total().cents() }),
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookNotification, VerificationError> {
        if !verify_hmac_sha256_hex(self.secret.as_bytes(), payload, signature_header) {
            return Err(VerificationError::InvalidSignature);
        }

        let event: MockWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| VerificationError::MalformedPayload(e.to_string()))?;

        if event.event != "payment.captured" {
            return Ok(WebhookNotification::Ignored { event: event.event });
        }

        match (event.correlation_id, event.settlement_id) {
            (Some(correlation_id), Some(settlement_id)) => Ok(WebhookNotification::Captured {
                correlation_id,
                settlement_id,
            }),
            _ => Err(VerificationError::MalformedPayload(
                "capture event missing ids".to_string(),
            )),
        }
    }

    fn verify_settlement(&self, claim: &SettlementClaim) -> Result<Settlement, VerificationError> {
        let message = format!("{}|{}", claim.provider_order_id, claim.provider_payment_id);
        if !verify_hmac_sha256_hex(
            self.secret.as_bytes(),
            message.as_bytes(),
            &claim.provider_signature,
        ) {
            return Err(VerificationError::InvalidSignature);
        }

        Ok(Settlement {
            correlation_id: claim.provider_order_id.clone(),
            settlement_id: claim.provider_payment_id.clone(),
        })
    }
}
