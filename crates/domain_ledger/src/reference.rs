//! Transaction reference generation
//!
//! Generated references have the form `PREFIX-YYYYMMDDHHMMSSmmm-XXXXXXXX`:
//! a per-operation prefix, the UTC timestamp to the millisecond, and eight
//! random hex characters. Caller-supplied references (invoice numbers,
//! client idempotency keys) are used verbatim after trimming.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Per-operation reference prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferencePrefix {
    Deposit,
    Withdrawal,
    Transfer,
    BillPayment,
    LoanRepayment,
    /// Initial deposit posted when an account is opened
    Opening,
}

impl ReferencePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePrefix::Deposit => "DEP",
            ReferencePrefix::Withdrawal => "WDL",
            ReferencePrefix::Transfer => "TRF",
            ReferencePrefix::BillPayment => "BILL",
            ReferencePrefix::LoanRepayment => "LRP",
            ReferencePrefix::Opening => "OPN",
        }
    }
}

impl fmt::Display for ReferencePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates a fresh reference stamped with `now`
pub fn generate(prefix: ReferencePrefix, now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        now.format("%Y%m%d%H%M%S%3f"),
        random[..8].to_ascii_uppercase()
    )
}

/// Returns the caller's reference, or `None` when it is absent or blank
pub fn caller_supplied(reference: Option<&str>) -> Option<String> {
    reference
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

/// Uses the caller's reference when present, otherwise generates one
///
/// The flag is true when the reference came from the caller and therefore
/// makes the request replayable.
pub fn resolve(
    reference: Option<&str>,
    prefix: ReferencePrefix,
    now: DateTime<Utc>,
) -> (String, bool) {
    match caller_supplied(reference) {
        Some(reference) => (reference, true),
        None => (generate(prefix, now), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_generated_format() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 9, 5, 3).unwrap();
        let reference = generate(ReferencePrefix::Transfer, now);

        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TRF");
        assert_eq!(parts[1], "20240701090503000");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_same_instant_does_not_collide() {
        let now = Utc::now();
        let references: HashSet<String> =
            (0..1000).map(|_| generate(ReferencePrefix::Deposit, now)).collect();
        assert_eq!(references.len(), 1000);
    }

    #[test]
    fn test_blank_caller_reference_is_ignored() {
        assert_eq!(caller_supplied(Some("  INV-42 ")), Some("INV-42".to_string()));
        assert_eq!(caller_supplied(Some("   ")), None);
        assert_eq!(caller_supplied(None), None);

        let (generated, from_caller) = resolve(Some(""), ReferencePrefix::BillPayment, Utc::now());
        assert!(generated.starts_with("BILL-"));
        assert!(!from_caller);
    }
}
