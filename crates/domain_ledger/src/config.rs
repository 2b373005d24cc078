//! Ledger policy configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Timezone;

/// Default amount at or above which bill payments need a document
pub const DEFAULT_VERIFICATION_THRESHOLD: Decimal = dec!(10000);

/// Default and maximum number of rows in an account statement
pub const DEFAULT_STATEMENT_LIMIT: usize = 50;
pub const MAX_STATEMENT_LIMIT: usize = 500;

/// Policy values read by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Bill payments at or above this amount require a supporting document
    pub verification_threshold: Decimal,
    /// Calendar used for "local midnight" and "first of month" windows
    pub timezone: Timezone,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verification_threshold: DEFAULT_VERIFICATION_THRESHOLD,
            timezone: Timezone::default(),
        }
    }
}

impl LedgerConfig {
    /// Sets the verification threshold; non-positive values keep the default
    pub fn with_verification_threshold(mut self, threshold: Decimal) -> Self {
        self.verification_threshold = if threshold > Decimal::ZERO {
            threshold
        } else {
            DEFAULT_VERIFICATION_THRESHOLD
        };
        self
    }

    /// Sets the limit timezone
    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.verification_threshold, dec!(10000));
        assert_eq!(config.timezone.name(), "UTC");
    }

    #[test]
    fn test_invalid_threshold_falls_back() {
        let config = LedgerConfig::default().with_verification_threshold(dec!(-5));
        assert_eq!(config.verification_threshold, DEFAULT_VERIFICATION_THRESHOLD);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{"timezone":"Europe/London"}"#).unwrap();
        assert_eq!(config.verification_threshold, DEFAULT_VERIFICATION_THRESHOLD);
        assert_eq!(config.timezone.name(), "Europe/London");
    }
}
