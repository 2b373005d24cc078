//! API configuration

use core_kernel::Timezone;
use domain_ledger::LedgerConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// API configuration
///
/// Every field has a default, so an empty environment yields a working
/// development setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL; when absent the server keeps the ledger in memory
    pub database_url: Option<String>,
    /// Maximum pooled database connections
    pub database_max_connections: u32,
    /// Row lock wait budget in milliseconds
    pub lock_timeout_ms: u64,
    /// Log level
    pub log_level: String,
    /// Bill payments at or above this amount need a supporting document
    pub verification_threshold: Option<String>,
    /// IANA timezone whose calendar drives spending limit windows
    pub timezone: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: None,
            database_max_connections: 10,
            lock_timeout_ms: 5_000,
            log_level: "info".to_string(),
            verification_threshold: None,
            timezone: "UTC".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Row lock wait budget
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Ledger settings derived from this configuration
    ///
    /// A missing, unparsable or non-positive threshold and an unknown
    /// timezone fall back to the ledger defaults.
    pub fn ledger_config(&self) -> LedgerConfig {
        let mut ledger = LedgerConfig::default();

        if let Some(raw) = self.verification_threshold.as_deref() {
            match Decimal::from_str(raw.trim()) {
                Ok(threshold) => ledger = ledger.with_verification_threshold(threshold),
                Err(_) => tracing::warn!(
                    value = %raw,
                    "unparsable verification threshold, using default"
                ),
            }
        }

        match Timezone::parse(&self.timezone) {
            Ok(timezone) => ledger = ledger.with_timezone(timezone),
            Err(error) => tracing::warn!(error = %error, "unknown timezone, using UTC"),
        }

        ledger
    }
}
