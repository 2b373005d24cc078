//! Transfer coordinator
//!
//! Moves money between two accounts as a debit/credit pair sharing one
//! reference. The steps run in a fixed order inside the caller's scope:
//!
//! 1. resolve the destination (by id or account number)
//! 2. reject a transfer to the source itself
//! 3. lock both accounts in ascending id order
//! 4. detect an idempotent replay of a caller reference
//! 5. require a supporting document when the plan carries a threshold
//! 6. evaluate the source's spending allowance
//! 7. debit the source, then credit the destination
//!
//! The caller's reference is owned by the debit leg. The credit leg echoes
//! it, so different payers may reuse one reference towards the same account.
//!
//! A failure at any step leaves the scope to be rolled back, so either both
//! legs become visible or neither does.

use chrono::{DateTime, Utc};

use core_kernel::{Money, Timezone};

use crate::account::Account;
use crate::commands::{positive_amount, Actor, Destination};
use crate::error::LedgerError;
use crate::limits;
use crate::mutator::{self, Mutation};
use crate::ports::LedgerScope;
use crate::reference::{self, ReferencePrefix};
use crate::transaction::{TransactionType, TransferReceipt};

/// A transfer ready to run
#[derive(Debug, Clone)]
pub struct TransferPlan<'a> {
    pub actor: Actor,
    pub from: core_kernel::AccountId,
    pub to: &'a Destination,
    pub amount: rust_decimal::Decimal,
    pub description: &'a str,
    pub reference: Option<&'a str>,
    pub prefix: ReferencePrefix,
    pub kind: TransactionType,
    /// Category recorded on the debit leg
    pub category: Option<&'a str>,
    /// Supporting document recorded on the debit leg
    pub document_ref: Option<&'a str>,
    /// Amounts at or above this need `document_ref`
    pub verification_threshold: Option<rust_decimal::Decimal>,
}

/// Runs a transfer inside `scope`
pub async fn execute(
    scope: &mut dyn LedgerScope,
    plan: TransferPlan<'_>,
    timezone: Timezone,
    now: DateTime<Utc>,
) -> Result<TransferReceipt, LedgerError> {
    let destination_id = resolve_destination(scope, plan.to).await?.id;
    if destination_id == plan.from {
        return Err(LedgerError::SameAccountTransfer);
    }

    let (source, destination) = lock_pair(scope, &plan, destination_id).await?;

    if !source.is_active() {
        return Err(LedgerError::AccountNotActive {
            account: source.id.to_string(),
            status: source.status.to_string(),
        });
    }
    if destination.currency != source.currency {
        return Err(LedgerError::CurrencyMismatch {
            expected: source.currency.to_string(),
            actual: destination.currency.to_string(),
        });
    }
    let amount = positive_amount(plan.amount, source.currency)?;

    let (reference, from_caller) = reference::resolve(plan.reference, plan.prefix, now);
    if from_caller {
        if let Some(receipt) =
            find_replay(scope, &reference, &source, &destination, &amount, plan.kind).await?
        {
            tracing::debug!(
                reference = %reference,
                from_account = %source.id,
                to_account = %destination.id,
                "transfer replayed"
            );
            return Ok(receipt);
        }
    }

    if let Some(threshold) = plan.verification_threshold {
        let threshold = Money::new(threshold, source.currency);
        if amount >= threshold && plan.document_ref.is_none() {
            tracing::debug!(
                account_id = %source.id,
                to_account = %destination.id,
                "payment needs a supporting document"
            );
            return Err(LedgerError::VerificationRequired { threshold });
        }
    }

    limits::evaluate(scope, &source, now, timezone)
        .await?
        .ensure_allows(&amount)?;

    let debit = mutator::apply(
        scope,
        Mutation::new(source.id, -amount, plan.kind, &reference, plan.description)
            .with_counterparty(destination.id)
            .with_category(plan.category)
            .with_document(plan.document_ref),
        now,
    )
    .await?;

    let credit = mutator::apply(
        scope,
        Mutation::new(destination.id, amount, plan.kind, &reference, plan.description)
            .with_counterparty(source.id),
        now,
    )
    .await?;

    Ok(TransferReceipt {
        debit,
        credit,
        replayed: false,
    })
}

/// Finds the destination account; it must exist and be active
async fn resolve_destination(
    scope: &mut dyn LedgerScope,
    destination: &Destination,
) -> Result<Account, LedgerError> {
    let (found, label) = match destination {
        Destination::Account(id) => (scope.find_account(*id).await?, id.to_string()),
        Destination::AccountNumber(number) => (
            scope.find_account_by_number(number.trim()).await?,
            number.clone(),
        ),
    };
    found
        .filter(Account::is_active)
        .ok_or(LedgerError::AccountNotFound(label))
}

/// Locks source and destination in ascending id order
async fn lock_pair(
    scope: &mut dyn LedgerScope,
    plan: &TransferPlan<'_>,
    destination_id: core_kernel::AccountId,
) -> Result<(Account, Account), LedgerError> {
    let source_first = plan.from < destination_id;
    let (first, second) = if source_first {
        (plan.from, destination_id)
    } else {
        (destination_id, plan.from)
    };

    let first = scope.lock_account(first).await?;
    let second = scope.lock_account(second).await?;
    let (source, destination) = if source_first {
        (first, second)
    } else {
        (second, first)
    };

    let source = source
        .filter(|a| plan.actor.can_access(a.owner_id))
        .ok_or_else(|| LedgerError::AccountNotFound(plan.from.to_string()))?;
    // Re-checked under the lock; the destination may have changed since resolution
    let destination = destination
        .filter(Account::is_active)
        .ok_or_else(|| LedgerError::AccountNotFound(destination_id.to_string()))?;

    Ok((source, destination))
}

/// Returns the earlier result if `reference` was already used for this exact transfer
async fn find_replay(
    scope: &mut dyn LedgerScope,
    reference: &str,
    source: &Account,
    destination: &Account,
    amount: &Money,
    kind: TransactionType,
) -> Result<Option<TransferReceipt>, LedgerError> {
    let Some(debit) = scope.find_by_reference(source.id, reference).await? else {
        return Ok(None);
    };

    let same_request = debit.transaction_type == kind
        && debit.amount == -*amount
        && debit.counterparty_account_id == Some(destination.id);
    if !same_request {
        return Err(LedgerError::DuplicateReference(reference.to_string()));
    }

    let credit = scope
        .find_reference_group(reference)
        .await?
        .into_iter()
        .find(|t| {
            t.account_id == destination.id
                && t.amount == *amount
                && t.counterparty_account_id == Some(source.id)
        })
        .ok_or_else(|| LedgerError::DuplicateReference(reference.to_string()))?;

    Ok(Some(TransferReceipt {
        debit,
        credit,
        replayed: true,
    }))
}
