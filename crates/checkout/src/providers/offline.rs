//! Offline payment methods: settlement happens out-of-band, the order stays
//! unpaid, and there is no verification path.

use async_trait::async_trait;
use domain::Order;

use crate::config::BankTransferConfig;
use crate::error::ProviderError;

use super::{MethodInfo, PaymentProvider, ProviderKind, ProviderSession};

/// Cash on delivery: always available, no credentials, payable on arrival.
#[derive(Debug, Clone, Default)]
pub struct CashOnDeliveryProvider;

impl CashOnDeliveryProvider {
    /// Creates the cash-on-delivery provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentProvider for CashOnDeliveryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CashOnDelivery
    }

    fn describe(&self) -> MethodInfo {
        MethodInfo {
            kind: self.kind(),
            name: "Cash on Delivery",
            description: "Pay with cash upon delivery".to_string(),
        }
    }

    async fn initiate(&self, order: &Order) -> Result<ProviderSession, ProviderError> {
        tracing::info!(order_id = %order.id, "cash on delivery selected");
        Ok(ProviderSession::Instructions {
            title: "Cash on Delivery".to_string(),
            detail: format!(
                "Your order will be processed and {} is payable upon delivery.",
                order.total()
            ),
        })
    }
}

/// Manual bank transfer to a configured payee handle.
#[derive(Debug, Clone)]
pub struct BankTransferProvider {
    config: BankTransferConfig,
}

impl BankTransferProvider {
    /// Creates the bank transfer provider from its payee configuration.
    pub fn new(config: BankTransferConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PaymentProvider for BankTransferProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::BankTransfer
    }

    fn describe(&self) -> MethodInfo {
        MethodInfo {
            kind: self.kind(),
            name: "Bank Transfer (Manual)",
            description: format!("Pay to {}", self.config.payee_handle),
        }
    }

    async fn initiate(&self, order: &Order) -> Result<ProviderSession, ProviderError> {
        tracing::info!(order_id = %order.id, "manual bank transfer selected");
        Ok(ProviderSession::Instructions {
            title: format!("Transfer to {}", self.config.payee_name),
            detail: format!(
                "Send {} to {} and quote order {} in the transfer note.",
                order.total(),
                self.config.payee_handle,
                order.id
            ),
        })
    }
}
