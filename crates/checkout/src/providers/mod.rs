//! Payment provider adapters.
//!
//! One polymorphic interface over every way the storefront can take money:
//! offline methods (cash on delivery, manual bank transfer) and remote
//! gateways (card and regional). Each adapter knows how to initiate a charge
//! for an order and how to authenticate inbound notifications about it.

mod mock;
mod offline;
mod razorpay;
mod signature;
mod stripe;

pub use mock::MockProvider;
pub use offline::{BankTransferProvider, CashOnDeliveryProvider};
pub use razorpay::RazorpayProvider;
pub use stripe::StripeProvider;

use async_trait::async_trait;
use domain::Order;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, VerificationError};

/// The payment methods the storefront can offer.
///
/// Serialized forms match the URL slugs used in payment routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Pay with cash upon delivery.
    #[serde(rename = "cod")]
    CashOnDelivery,
    /// Manual UPI-style transfer to a configured payee.
    BankTransfer,
    /// Card gateway (worldwide cards).
    Stripe,
    /// Regional gateway (UPI, cards, net banking).
    Razorpay,
}

impl ProviderKind {
    /// The URL slug used in payment routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::CashOnDelivery => "cod",
            ProviderKind::BankTransfer => "bank-transfer",
            ProviderKind::Stripe => "stripe",
            ProviderKind::Razorpay => "razorpay",
        }
    }

    /// The HTTP header carrying the webhook signature, for providers that
    /// deliver webhooks.
    pub fn signature_header(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Stripe => Some("stripe-signature"),
            ProviderKind::Razorpay => Some("x-razorpay-signature"),
            ProviderKind::CashOnDelivery | ProviderKind::BankTransfer => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(ProviderKind::CashOnDelivery),
            "bank-transfer" => Ok(ProviderKind::BankTransfer),
            "stripe" => Ok(ProviderKind::Stripe),
            "razorpay" => Ok(ProviderKind::Razorpay),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// A payment-method slug that matches no known provider.
#[derive(Debug, thiserror::Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownProvider(pub String);

/// Method-selection metadata shown on the payment page.
#[derive(Debug, Clone, Serialize)]
pub struct MethodInfo {
    pub kind: ProviderKind,
    pub name: &'static str,
    pub description: String,
}

/// What `initiate` hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderSession {
    /// Offline method: show these instructions; settlement happens
    /// out-of-band and the order stays unpaid.
    Instructions { title: String, detail: String },

    /// Remote gateway: a charge/session was created; hand the payload to
    /// the client SDK. The correlation id is persisted onto the order
    /// before this is returned to the caller.
    ClientSession {
        correlation_id: String,
        client_payload: serde_json::Value,
    },
}

impl ProviderSession {
    /// The provider correlation id, when this session has one.
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            ProviderSession::Instructions { .. } => None,
            ProviderSession::ClientSession { correlation_id, .. } => Some(correlation_id),
        }
    }
}

/// A verified, parsed webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookNotification {
    /// The provider captured a payment.
    Captured {
        /// The provider's correlation id (matches `Order::payment_intent_id`).
        correlation_id: String,
        /// The provider's settlement id.
        settlement_id: String,
    },
    /// Authentic but irrelevant event; acknowledged with no state change.
    Ignored { event: String },
}

/// The body of a synchronous "verify now" call made by the client right
/// after the provider's SDK reports success.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementClaim {
    pub provider_order_id: String,
    pub provider_payment_id: String,
    pub provider_signature: String,
}

/// A verified settlement extracted from a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub correlation_id: String,
    pub settlement_id: String,
}

/// Trait for payment provider adapters.
///
/// `initiate` creates whatever the client needs to pay for the order;
/// `verify_webhook` and `verify_settlement` authenticate inbound
/// notifications BEFORE any payload field is trusted. Verification is pure
/// (no I/O): authenticity comes from the shared secret, not from a
/// round-trip to the provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Which method this adapter implements.
    fn kind(&self) -> ProviderKind;

    /// Method-selection metadata.
    fn describe(&self) -> MethodInfo;

    /// Initiates payment for an order: creates the remote charge/session
    /// for gateways, or produces display instructions for offline methods.
    async fn initiate(&self, order: &Order) -> Result<ProviderSession, ProviderError>;

    /// Authenticates a webhook delivery from its RAW payload bytes and
    /// signature header, then parses it. Offline methods have no webhook
    /// path.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookNotification, VerificationError> {
        let _ = (payload, signature_header);
        Err(VerificationError::Unsupported(self.kind()))
    }

    /// Authenticates a synchronous settlement claim. Only providers with a
    /// client-side signature scheme support this.
    fn verify_settlement(&self, claim: &SettlementClaim) -> Result<Settlement, VerificationError> {
        let _ = claim;
        Err(VerificationError::Unsupported(self.kind()))
    }
}
