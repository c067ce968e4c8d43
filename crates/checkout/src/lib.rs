//! Checkout core for the storefront.
//!
//! This crate owns the three pieces where the correctness risk lives:
//! - [`CheckoutOrchestrator`]: validates the cart against live stock,
//!   creates the order atomically with its inventory reservations, and
//!   dispatches to a payment provider.
//! - [`PaymentProvider`] adapters: one polymorphic `{initiate, verify}`
//!   interface over cash-on-delivery, manual bank transfer, and the two
//!   remote gateways, assembled into a [`ProviderRegistry`] from
//!   configuration.
//! - [`Reconciler`]: verifies inbound settlement notifications (webhook or
//!   synchronous client claim) and applies the idempotent `paid` transition.

pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod providers;
pub mod reconciler;
pub mod registry;

pub use config::{BankTransferConfig, PaymentConfig, RazorpayConfig, StripeConfig};
pub use error::{
    CheckoutError, ProviderError, ReconcileError, StockShortage, VerificationError,
};
pub use notify::{InMemoryNotifier, LogNotifier, NotificationService, NotifyError};
pub use orchestrator::CheckoutOrchestrator;
pub use providers::{
    MethodInfo, MockProvider, PaymentProvider, ProviderKind, ProviderSession, Settlement,
    SettlementClaim, UnknownProvider, WebhookNotification,
};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use registry::ProviderRegistry;
