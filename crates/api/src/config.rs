//! Application configuration loaded from environment variables.

use checkout::{BankTransferConfig, PaymentConfig, RazorpayConfig, StripeConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string; the in-memory store is
///   used when unset
/// - `COD_ENABLED` — cash on delivery (default: enabled)
/// - `UPI_ENABLED`, `UPI_VPA`, `UPI_PAYEE_NAME` — manual bank transfer
/// - `STRIPE_ENABLED`, `STRIPE_SECRET_KEY`, `STRIPE_PUBLISHABLE_KEY`,
///   `STRIPE_WEBHOOK_SECRET`, `DEFAULT_CURRENCY` — card gateway
/// - `RAZORPAY_ENABLED`, `RAZORPAY_KEY_ID`, `RAZORPAY_KEY_SECRET`,
///   `RAZORPAY_WEBHOOK_SECRET` — regional gateway
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub payment: PaymentConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            payment: payment_from_env(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            payment: PaymentConfig::default(),
        }
    }
}

fn flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn payment_from_env() -> PaymentConfig {
    let bank_transfer = if flag("UPI_ENABLED", false) {
        std::env::var("UPI_VPA").ok().map(|payee_handle| BankTransferConfig {
            payee_handle,
            payee_name: std::env::var("UPI_PAYEE_NAME")
                .unwrap_or_else(|_| "Storefront".to_string()),
        })
    } else {
        None
    };

    let stripe = if flag("STRIPE_ENABLED", false) {
        std::env::var("STRIPE_SECRET_KEY").ok().map(|secret_key| StripeConfig {
            secret_key,
            publishable_key: std::env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            currency: std::env::var("DEFAULT_CURRENCY")
                .unwrap_or_else(|_| "usd".to_string())
                .to_ascii_lowercase(),
        })
    } else {
        None
    };

    let razorpay = if flag("RAZORPAY_ENABLED", false) {
        match (
            std::env::var("RAZORPAY_KEY_ID"),
            std::env::var("RAZORPAY_KEY_SECRET"),
        ) {
            (Ok(key_id), Ok(key_secret)) => Some(RazorpayConfig {
                key_id,
                key_secret,
                webhook_secret: std::env::var("RAZORPAY_WEBHOOK_SECRET").unwrap_or_default(),
            }),
            _ => None,
        }
    } else {
        None
    };

    PaymentConfig {
        cod_enabled: flag("COD_ENABLED", true),
        bank_transfer,
        stripe,
        razorpay,
    }
}
