//! Checkout error types.

use common::{OrderId, ProductId};
use serde::Serialize;
use store::StoreError;
use thiserror::Error;

use crate::providers::ProviderKind;

/// One cart line that asked for more units than are available.
///
/// Carried in full so the checkout form can render a per-line message with
/// the precise availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortage {
    pub product_id: ProductId,
    pub product_name: String,
    pub requested: u32,
    pub available: u32,
}

/// Errors surfaced by the checkout orchestrator.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requires a non-empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// One or more cart lines exceed the available stock. All violations
    /// are collected, not just the first.
    #[error("insufficient stock for {} cart line(s)", .0.len())]
    InsufficientStock(Vec<StockShortage>),

    /// A cart line references a product that no longer exists.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order belongs to a different user.
    #[error("order does not belong to the requesting user")]
    Forbidden,

    /// The order is already settled; payment cannot be initiated again.
    #[error("order is already paid")]
    AlreadyPaid,

    /// No payment providers are enabled in configuration.
    #[error("no payment providers are enabled")]
    NoProvidersEnabled,

    /// The requested payment method is not in the enabled set.
    #[error("payment method {0} is not available")]
    ProviderUnavailable(ProviderKind),

    /// The store failed; the order was not created (or not read). Details
    /// are logged, the user sees a generic retryable message.
    #[error("order could not be created")]
    Storage(#[source] StoreError),

    /// Remote payment initiation failed.
    #[error("payment initiation failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors from a payment provider adapter's remote initiation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The gateway request itself failed (network, TLS, timeout).
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with something we cannot use.
    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),
}

/// Errors from verifying an inbound provider notification or claim.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The signature does not match the payload. Security-relevant; the
    /// caller logs it and reveals nothing further.
    #[error("invalid signature")]
    InvalidSignature,

    /// The payload could not be parsed after its signature checked out.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// This provider has no such verification path (offline methods settle
    /// out-of-band; only the regional gateway defines a client-side claim).
    #[error("{0} does not support this verification path")]
    Unsupported(ProviderKind),
}

/// Errors from the reconciliation paths.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Signature or payload verification failed.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The provider is not in the enabled set (sync path only; the webhook
    /// path acknowledges deliveries for disabled providers as no-ops).
    #[error("payment method {0} is not available")]
    ProviderUnavailable(ProviderKind),

    /// The claimed correlation id matches no order (sync path only).
    #[error("no order matches correlation id {0}")]
    OrderNotFound(String),

    /// The order belongs to a different user (sync path only).
    #[error("order does not belong to the requesting user")]
    Forbidden,

    /// The store failed while applying the settlement.
    #[error("storage failure during reconciliation: {0}")]
    Storage(#[from] StoreError),
}
