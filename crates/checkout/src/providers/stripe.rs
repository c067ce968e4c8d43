//! Card gateway adapter (Stripe wire conventions).

use async_trait::async_trait;
use domain::Order;
use serde::Deserialize;

use crate::config::StripeConfig;
use crate::error::{ProviderError, VerificationError};

use super::signature::verify_hmac_sha256_hex;
use super::{MethodInfo, PaymentProvider, ProviderKind, ProviderSession, WebhookNotification};

const API_BASE: &str = "https://api.stripe.com/v1";

/// Webhook timestamps older or newer than this are rejected to blunt
/// replayed deliveries.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Card gateway adapter. Owns its HTTP client and credentials; constructed
/// once from configuration.
#[derive(Debug, Clone)]
pub struct StripeProvider {
    config: StripeConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
struct WebhookEventData {
    object: WebhookEventObject,
}

#[derive(Debug, Deserialize)]
struct WebhookEventObject {
    id: String,
    latest_charge: Option<String>,
}

impl StripeProvider {
    /// Creates the card gateway adapter.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Splits a `t=<ts>,v1=<hex>,...` signature header into the timestamp
    /// and the candidate signatures.
    fn parse_signature_header(header: &str) -> Option<(i64, Vec<&str>)> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let (key, value) = part.trim().split_once('=')?;
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => signatures.push(value),
                _ => {}
            }
        }
        match (timestamp, signatures.is_empty()) {
            (Some(ts), false) => Some((ts, signatures)),
            _ => None,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stripe
    }

    fn describe(&self) -> MethodInfo {
        MethodInfo {
            kind: self.kind(),
            name: "Stripe",
            description: "Pay with credit/debit cards worldwide".to_string(),
        }
    }

    async fn initiate(&self, order: &Order) -> Result<ProviderSession, ProviderError> {
        // Amounts are billed in integer minor units; Money already is one.
        let params = [
            ("amount", order.total().cents().to_string()),
            ("currency", self.config.currency.clone()),
            ("metadata[order_id]", order.id.to_string()),
        ];

        let response = self
            .http
            .post(format!("{API_BASE}/payment_intents"))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UnexpectedResponse(format!(
                "payment intent creation returned {status}: {body}"
            )));
        }

        let intent: PaymentIntentResponse = response.json().await?;
        tracing::info!(order_id = %order.id, intent_id = %intent.id, "payment intent created");

        Ok(ProviderSession::ClientSession {
            correlation_id: intent.id,
            client_payload: serde_json::json!({
                "client_secret": intent.client_secret,
                "publishable_key": self.config.publishable_key,
            }),
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookNotification, VerificationError> {
        let (timestamp, signatures) = Self::parse_signature_header(signature_header)
            .ok_or(VerificationError::InvalidSignature)?;

        let age = (chrono::Utc::now().timestamp() - timestamp).abs();
        if age > SIGNATURE_TOLERANCE_SECS {
            return Err(VerificationError::InvalidSignature);
        }

        // The signed message is "<timestamp>.<raw body>".
        let mut message = Vec::with_capacity(payload.len() + 16);
        message.extend_from_slice(timestamp.to_string().as_bytes());
        message.push(b'.');
        message.extend_from_slice(payload);

        let secret = self.config.webhook_secret.as_bytes();
        if !signatures
            .iter()
            .any(|sig| verify_hmac_sha256_hex(secret, &message, sig))
        {
            return Err(VerificationError::InvalidSignature);
        }

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| VerificationError::MalformedPayload(e.to_string()))?;

        if event.event_type != "payment_intent.succeeded" {
            return Ok(WebhookNotification::Ignored {
                event: event.event_type,
            });
        }

        let settlement_id = event
            .data
            .object
            .latest_charge
            .unwrap_or_else(|| event.data.object.id.clone());

        Ok(WebhookNotification::Captured {
            correlation_id: event.data.object.id,
            settlement_id,
        })
    }
}
