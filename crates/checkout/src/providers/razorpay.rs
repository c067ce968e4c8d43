//! Regional gateway adapter (Razorpay wire conventions).

use async_trait::async_trait;
use domain::Order;
use serde::Deserialize;

use crate::config::RazorpayConfig;
use crate::error::{ProviderError, VerificationError};

use super::signature::verify_hmac_sha256_hex;
use super::{
    MethodInfo, PaymentProvider, ProviderKind, ProviderSession, Settlement, SettlementClaim,
    WebhookNotification,
};

const API_BASE: &str = "https://api.razorpay.com/v1";

/// Regional gateway adapter. Charges are denominated in INR paise.
#[derive(Debug, Clone)]
pub struct RazorpayProvider {
    config: RazorpayConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GatewayOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    payload: Option<WebhookPayload>,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    payment: WebhookPaymentWrapper,
}

#[derive(Debug, Deserialize)]
struct WebhookPaymentWrapper {
    entity: WebhookPaymentEntity,
}

#[derive(Debug, Deserialize)]
struct WebhookPaymentEntity {
    id: String,
    order_id: String,
}

impl RazorpayProvider {
    /// Creates the regional gateway adapter.
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentProvider for RazorpayProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Razorpay
    }

    fn describe(&self) -> MethodInfo {
        MethodInfo {
            kind: self.kind(),
            name: "Razorpay",
            description: "Pay with UPI, cards, net banking & more".to_string(),
        }
    }

    async fn initiate(&self, order: &Order) -> Result<ProviderSession, ProviderError> {
        let body = serde_json::json!({
            // Paise: the minor-unit amount, exact by construction.
            "amount": order.total().cents(),
            "currency": "INR",
            "receipt": format!("order_{}", order.id),
            "payment_capture": 1,
        });

        let response = self
            .http
            .post(format!("{API_BASE}/orders"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UnexpectedResponse(format!(
                "gateway order creation returned {status}: {body}"
            )));
        }

        let gateway_order: GatewayOrderResponse = response.json().await?;
        tracing::info!(
            order_id = %order.id,
            gateway_order_id = %gateway_order.id,
            "gateway order created"
        );

        Ok(ProviderSession::ClientSession {
            correlation_id: gateway_order.id.clone(),
            client_payload: serde_json::json!({
                "key": self.config.key_id,
                "order_id": gateway_order.id,
                "amount": gateway_order.amount,
                "currency": gateway_order.currency,
            }),
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookNotification, VerificationError> {
        // Plain HMAC-SHA256 hex over the raw body.
        if !verify_hmac_sha256_hex(
            self.config.webhook_secret.as_bytes(),
            payload,
            signature_header,
        ) {
            return Err(VerificationError::InvalidSignature);
        }

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| VerificationError::MalformedPayload(e.to_string()))?;

        if event.event != "payment.captured" {
            return Ok(WebhookNotification::Ignored { event: event.event });
        }

        let entity = event
            .payload
            .map(|p| p.payment.entity)
            .ok_or_else(|| {
                VerificationError::MalformedPayload("capture event without payment entity".into())
            })?;

        Ok(WebhookNotification::Captured {
            correlation_id: entity.order_id,
            settlement_id: entity.id,
        })
    }

    fn verify_settlement(&self, claim: &SettlementClaim) -> Result<Settlement, VerificationError> {
        // The client-side signature covers "<gateway order id>|<payment id>"
        // keyed by the API secret.
        let message = format!("{}|{}", claim.provider_order_id, claim.provider_payment_id);
        if !verify_hmac_sha256_hex(
            self.config.key_secret.as_bytes(),
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
