//! Payment provider configuration.
//!
//! Each provider is individually enabled by the presence of its config
//! section; the registry only assembles the enabled set. Gateway clients are
//! constructed once from these values — there are no process-wide SDK
//! singletons.

/// Configuration for the whole payment surface.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Cash on delivery: an offline method with no credentials, enabled by
    /// default and toggled off explicitly.
    pub cod_enabled: bool,
    /// Manual bank transfer instructions, enabled when a payee is set.
    pub bank_transfer: Option<BankTransferConfig>,
    /// Card gateway, enabled when keys are set.
    pub stripe: Option<StripeConfig>,
    /// Regional gateway, enabled when keys are set.
    pub razorpay: Option<RazorpayConfig>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            cod_enabled: true,
            bank_transfer: None,
            stripe: None,
            razorpay: None,
        }
    }
}

/// Payee details shown on the manual bank transfer instructions page.
#[derive(Debug, Clone)]
pub struct BankTransferConfig {
    /// The UPI-style payment handle customers transfer to.
    pub payee_handle: String,
    /// Display name of the payee.
    pub payee_name: String,
}

/// Card gateway credentials.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    pub webhook_secret: String,
    /// ISO currency code used for charges, lowercase (e.g. "usd").
    pub currency: String,
}

/// Regional gateway credentials. Charges are denominated in INR.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
}
