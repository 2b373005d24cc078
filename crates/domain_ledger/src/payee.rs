//! Bill payees
//!
//! Payees are static reference data: a display name, the account number
//! payments are credited to, and a category used to label the debit.

use serde::{Deserialize, Serialize};

use core_kernel::PayeeId;

/// A registered bill payee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPayee {
    pub id: PayeeId,
    pub name: String,
    /// Account number that receives payments
    pub account_number: String,
    /// Category copied onto the payer's debit (e.g. "utilities")
    pub category: String,
}

impl BillPayee {
    /// Creates a new payee
    pub fn new(
        name: impl Into<String>,
        account_number: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: PayeeId::new_v7(),
            name: name.into(),
            account_number: account_number.into(),
            category: category.into(),
        }
    }
}
