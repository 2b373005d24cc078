//! Bill payment verifier
//!
//! Pays a registered payee through the transfer coordinator. Payments at or
//! above the verification threshold need a supporting document, checked
//! after replay detection. The document is only carried along; producing
//! and reading it happens elsewhere.

use chrono::{DateTime, Utc};

use crate::commands::{Actor, BillPaymentRequest, Destination};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ports::LedgerScope;
use crate::reference::ReferencePrefix;
use crate::transaction::{TransactionType, TransferReceipt};
use crate::transfer::{self, TransferPlan};

/// Pays a bill inside `scope`
///
/// # Errors
///
/// * `PayeeNotFound` - unknown payee
/// * `VerificationRequired` - amount at or above the threshold without a document
/// * anything the transfer coordinator returns
pub async fn pay(
    scope: &mut dyn LedgerScope,
    actor: Actor,
    request: &BillPaymentRequest,
    config: &LedgerConfig,
    now: DateTime<Utc>,
) -> Result<TransferReceipt, LedgerError> {
    let payee = scope
        .find_payee(request.payee_id)
        .await?
        .ok_or_else(|| LedgerError::PayeeNotFound(request.payee_id.to_string()))?;

    let document = request
        .document_ref
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let description = format!("Bill payment to {}", payee.name);
    let destination = Destination::AccountNumber(payee.account_number.clone());
    transfer::execute(
        scope,
        TransferPlan {
            actor,
            from: request.account_id,
            to: &destination,
            amount: request.amount,
            description: &description,
            reference: request.reference.as_deref(),
            prefix: ReferencePrefix::BillPayment,
            kind: TransactionType::BillPayment,
            category: Some(&payee.category),
            document_ref: document,
            verification_threshold: Some(config.verification_threshold),
        },
        config.timezone,
        now,
    )
    .await
}
