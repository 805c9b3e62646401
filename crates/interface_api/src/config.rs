//! API configuration
//!
//! Master data (posting accounts, tax codes, payment types) is configured
//! per deployment rather than fetched per request: a misconfigured chart of
//! accounts should fail at startup, not at the first approval.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use core_kernel::Currency;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Currency ledger equivalents are expressed in
    pub system_currency: Currency,
    /// Chart-of-accounts and master-data settings
    #[serde(default)]
    pub master: MasterDataSettings,
}

/// Master data resolved at startup and handed to the posting services
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MasterDataSettings {
    pub accounts: Option<AccountSettings>,
    #[serde(default)]
    pub tax_codes: Vec<TaxCodeSetting>,
    #[serde(default)]
    pub payment_types: Vec<PaymentTypeSetting>,
    /// Points accrued per unit of equivalent revenue; None disables loyalty
    pub loyalty_points_per_unit: Option<Decimal>,
}

/// Ledger account ids every tenant posting operation needs
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AccountSettings {
    pub accounts_receivable: Uuid,
    pub revenue: Uuid,
    pub tax_payable: Uuid,
    pub customer_deposits: Uuid,
    pub loyalty_points: Uuid,
    pub withholding_clearing: Uuid,
}

/// A withholding tax code and its payable account
#[derive(Debug, Clone, Deserialize)]
pub struct TaxCodeSetting {
    pub id: Uuid,
    pub name: String,
    pub withholding_account: Uuid,
}

/// A payment type and the asset account it settles into
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentTypeSetting {
    pub id: Uuid,
    pub name: String,
    pub account: Uuid,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/posting".to_string(),
            log_level: "info".to_string(),
            system_currency: Currency::USD,
            master: MasterDataSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from an optional file plus the environment
    ///
    /// Environment variables use the `API_` prefix with `__` separating
    /// nested keys, e.g. `API_MASTER__ACCOUNTS__REVENUE`.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/api").required(false))
            .add_source(config::Environment::with_prefix("API").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(config.master.accounts.is_none());
        assert!(config.master.tax_codes.is_empty());
    }
}
