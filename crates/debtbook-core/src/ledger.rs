use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::DebtbookError;
use crate::types::{LinkedTransaction, LoanAccount, ManualPayment, Money, TransactionKind};
use crate::DebtbookResult;

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn require_loan(account: &LoanAccount) -> DebtbookResult<()> {
    if account.kind != crate::types::AccountKind::Loan {
        return Err(DebtbookError::NotALoanAccount {
            kind: account.kind.as_str().to_string(),
        });
    }
    Ok(())
}

fn require_same_account(account: &LoanAccount, tx: &LinkedTransaction) -> DebtbookResult<()> {
    if tx.account_id != account.id {
        return Err(DebtbookError::NotFound {
            entity: "linked transaction for account".into(),
            id: tx.account_id.to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Installment tracking
// ---------------------------------------------------------------------------

/// Flip the paid checkmark of one installment.
///
/// Idempotent in pairs: toggling twice restores the original set. The paid
/// set is a tracking aid only and never moves `balance`; capital is driven
/// exclusively by transactions and manual payments. Numbers outside the
/// schedule are stored as-is and simply never match a row.
pub fn toggle_installment_paid(account: &mut LoanAccount, number: u32) -> DebtbookResult<()> {
    require_loan(account)?;
    if !account.paid_installments.insert(number) {
        account.paid_installments.remove(&number);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Manual payments
// ---------------------------------------------------------------------------

/// Record an out-of-band payment against the loan.
///
/// The amount must be positive; on rejection the account is untouched. The
/// capital balance drops by the amount, floored at zero. Returns the id of
/// the new payment record.
pub fn register_manual_payment(
    account: &mut LoanAccount,
    amount: Money,
    date: NaiveDate,
    note: &str,
) -> DebtbookResult<Uuid> {
    require_loan(account)?;
    if amount <= Decimal::ZERO {
        return Err(DebtbookError::InvalidAmount {
            reason: format!("Manual payment amount must be positive, got {amount}"),
        });
    }

    let payment = ManualPayment {
        id: Uuid::new_v4(),
        amount,
        date,
        note: note.to_string(),
    };
    let id = payment.id;

    account.manual_payments.push(payment);
    account.balance = (account.balance - amount).max(Decimal::ZERO);
    Ok(id)
}

/// Remove a previously registered manual payment and hand its amount back to
/// the balance.
///
/// The restore is deliberately uncapped while registration floors at zero:
/// deleting payments out of order relative to other balance-reducing events
/// can push `balance` above the original principal. `analyze_loan` surfaces
/// that as a warning instead of hiding it.
pub fn delete_manual_payment(
    account: &mut LoanAccount,
    payment_id: Uuid,
) -> DebtbookResult<ManualPayment> {
    require_loan(account)?;
    let position = account
        .manual_payments
        .iter()
        .position(|p| p.id == payment_id)
        .ok_or_else(|| DebtbookError::NotFound {
            entity: "manual payment".into(),
            id: payment_id.to_string(),
        })?;

    let removed = account.manual_payments.remove(position);
    account.balance += removed.amount;
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Linked transactions
// ---------------------------------------------------------------------------

/// Effect of an ordinary transaction on a loan account's capital balance.
/// The sign convention is inverted relative to asset accounts: income pays
/// the debt down, expense grows it.
fn balance_effect(tx: &LinkedTransaction) -> Money {
    match tx.kind {
        TransactionKind::Income => -tx.amount,
        TransactionKind::Expense => tx.amount,
    }
}

/// Apply the balance effect of a newly created transaction linked to this
/// loan account.
pub fn apply_transaction(account: &mut LoanAccount, tx: &LinkedTransaction) -> DebtbookResult<()> {
    require_loan(account)?;
    require_same_account(account, tx)?;
    account.balance += balance_effect(tx);
    Ok(())
}

/// Undo the balance effect of a deleted transaction. Exact inverse of
/// [`apply_transaction`] so a create/delete cycle cannot drift the balance.
pub fn revert_transaction(account: &mut LoanAccount, tx: &LinkedTransaction) -> DebtbookResult<()> {
    require_loan(account)?;
    require_same_account(account, tx)?;
    account.balance -= balance_effect(tx);
    Ok(())
}
