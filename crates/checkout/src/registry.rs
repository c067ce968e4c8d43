//! The configuration-enabled set of payment providers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PaymentConfig;
use crate::providers::{
    BankTransferProvider, CashOnDeliveryProvider, MethodInfo, PaymentProvider, ProviderKind,
    RazorpayProvider, StripeProvider,
};

/// Holds the enabled providers, keyed by kind.
///
/// Selection is configuration-driven: a provider missing from the registry
/// is simply not offered, and webhooks addressed to it are acknowledged as
/// no-ops. An empty registry is an operational error the orchestrator
/// surfaces before method selection.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn PaymentProvider>>,
    order: Vec<ProviderKind>,
}

impl ProviderRegistry {
    /// Assembles the enabled providers from configuration.
    pub fn from_config(config: &PaymentConfig) -> Self {
        let mut registry = Self::default();

        if config.cod_enabled {
            registry.register(Arc::new(CashOnDeliveryProvider::new()));
        }
        if let Some(bank) = &config.bank_transfer {
            registry.register(Arc::new(BankTransferProvider::new(bank.clone())));
        }
        if let Some(razorpay) = &config.razorpay {
            registry.register(Arc::new(RazorpayProvider::new(razorpay.clone())));
        }
        if let Some(stripe) = &config.stripe {
            registry.register(Arc::new(StripeProvider::new(stripe.clone())));
        }

        registry
    }

    /// Registers a provider, replacing any previous one of the same kind.
    pub fn register(&mut self, provider: Arc<dyn PaymentProvider>) {
        let kind = provider.kind();
        if self.providers.insert(kind, provider).is_none() {
            self.order.push(kind);
        }
    }

    /// Looks up an enabled provider.
    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn PaymentProvider>> {
        self.providers.get(&kind).cloned()
    }

    /// Returns true if no provider is enabled.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Method-selection metadata for every enabled provider, in
    /// registration order.
    pub fn methods(&self) -> Vec<MethodInfo> {
        self.order
            .iter()
            .filter_map(|kind| self.providers.get(kind))
            .map(|p| p.describe())
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("enabled", &self.order)
            .finish()
    }
}
