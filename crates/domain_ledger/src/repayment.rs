//! Loan repayment
//!
//! The loan row is locked before the account so that two repayments of the
//! same loan from different accounts serialize on the loan first.

use chrono::{DateTime, Utc};

use core_kernel::RepaymentId;

use crate::commands::{positive_amount, Actor, LoanRepaymentRequest};
use crate::error::LedgerError;
use crate::loan::{Repayment, RepaymentReceipt};
use crate::mutator::{self, Mutation};
use crate::ports::LedgerScope;
use crate::reference::{self, ReferencePrefix};
use crate::transaction::TransactionType;

/// Repays part or all of a loan inside `scope`
///
/// The full amount is debited even when it exceeds what is owed; the loan's
/// remaining amount is floored at zero.
pub async fn repay(
    scope: &mut dyn LedgerScope,
    actor: Actor,
    request: &LoanRepaymentRequest,
    now: DateTime<Utc>,
) -> Result<RepaymentReceipt, LedgerError> {
    let mut loan = scope
        .lock_loan(request.loan_id)
        .await?
        .filter(|l| actor.can_access(l.owner_id))
        .ok_or_else(|| LedgerError::LoanNotFound(request.loan_id.to_string()))?;
    loan.ensure_repayable()?;

    let account = scope
        .lock_account(request.account_id)
        .await?
        .filter(|a| a.owner_id == loan.owner_id && actor.can_access(a.owner_id))
        .ok_or_else(|| LedgerError::AccountNotFound(request.account_id.to_string()))?;

    if account.currency != loan.currency() {
        return Err(LedgerError::CurrencyMismatch {
            expected: loan.currency().to_string(),
            actual: account.currency.to_string(),
        });
    }
    let amount = positive_amount(request.amount, account.currency)?;

    let reference = reference::generate(ReferencePrefix::LoanRepayment, now);
    let description = format!("Repayment of loan {}", loan.id);
    let transaction = mutator::apply(
        scope,
        Mutation::new(
            account.id,
            -amount,
            TransactionType::LoanRepayment,
            &reference,
            &description,
        ),
        now,
    )
    .await?;

    let remaining_after = loan.apply_repayment(&amount, now)?;
    scope.save_loan(&loan).await?;

    let repayment = Repayment {
        id: RepaymentId::new_v7(),
        loan_id: loan.id,
        account_id: account.id,
        transaction_id: transaction.id,
        amount,
        remaining_after,
        created_at: now,
    };
    scope.insert_repayment(&repayment).await?;

    Ok(RepaymentReceipt {
        repayment,
        transaction,
        loan,
    })
}
