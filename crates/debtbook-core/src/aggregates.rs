use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DebtbookError;
use crate::schedule::{self, Installment};
use crate::types::{
    with_metadata, ComputationOutput, LinkedTransaction, LoanAccount, Money, TransactionKind,
};
use crate::DebtbookResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Derived totals reconciling the schedule against linked transactions and
/// manual payments. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtAggregates {
    /// Sum of gross payments across the whole schedule.
    pub total_scheduled_payments: Money,
    /// Income-type transactions linked to the loan account.
    pub total_from_linked_transactions: Money,
    pub total_manual_payments: Money,
    pub total_paid_to_date: Money,
    /// Scheduled total minus paid-to-date, floored at zero.
    pub projected_remaining_total: Money,
    /// First unpaid installment, None once every row is checked off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_installment: Option<Installment>,
    /// Checked-off installments over the term. Not clamped: out-of-range
    /// members of the paid set inflate it past 1.
    pub progress_ratio: Decimal,
    /// Display-only state; gates nothing.
    pub is_liquidated: bool,
}

/// Full read-side view of a loan: the fresh schedule plus the reconciled
/// aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysis {
    pub schedule: Vec<Installment>,
    pub aggregates: DebtAggregates,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Reconcile a schedule with the account's payment history.
///
/// Pure derivation over the inputs; transactions for other accounts and
/// expense-type transactions do not count toward the paid total.
pub fn compute_aggregates(
    account: &LoanAccount,
    schedule: &[Installment],
    linked_transactions: &[LinkedTransaction],
) -> DebtAggregates {
    let total_scheduled_payments: Money = schedule.iter().map(|i| i.gross_payment).sum();

    let total_from_linked_transactions: Money = linked_transactions
        .iter()
        .filter(|t| t.account_id == account.id && t.kind == TransactionKind::Income)
        .map(|t| t.amount)
        .sum();

    let total_manual_payments: Money = account.manual_payments.iter().map(|p| p.amount).sum();

    let total_paid_to_date = total_from_linked_transactions + total_manual_payments;
    let projected_remaining_total =
        (total_scheduled_payments - total_paid_to_date).max(Decimal::ZERO);

    let next_due_installment = schedule.iter().find(|i| !i.is_paid).cloned();

    let term_months = account.loan_details.term_months;
    let progress_ratio = if term_months == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(account.paid_installments.len() as u64) / Decimal::from(term_months)
    };

    DebtAggregates {
        total_scheduled_payments,
        total_from_linked_transactions,
        total_manual_payments,
        total_paid_to_date,
        projected_remaining_total,
        is_liquidated: next_due_installment.is_none(),
        next_due_installment,
        progress_ratio,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read entry point: validate the terms, compute a fresh schedule, reconcile
/// it against the payment history, and report the latent inconsistencies the
/// bookkeeping tolerates as warnings.
pub fn analyze_loan(
    account: &LoanAccount,
    linked_transactions: &[LinkedTransaction],
) -> DebtbookResult<ComputationOutput<LoanAnalysis>> {
    let start = Instant::now();

    if account.kind != crate::types::AccountKind::Loan {
        return Err(DebtbookError::NotALoanAccount {
            kind: account.kind.as_str().to_string(),
        });
    }

    let terms = &account.loan_details;
    schedule::validate_terms(terms)?;

    let mut warnings = schedule::stale_paid_warnings(terms, &account.paid_installments);
    if account.balance > terms.principal {
        warnings.push(format!(
            "Capital balance {} exceeds the original principal {}; manual payment deletions \
             are restored uncapped",
            account.balance, terms.principal
        ));
    }

    let rows = schedule::compute_schedule(terms, &account.paid_installments)?;
    let aggregates = compute_aggregates(account, &rows, linked_transactions);

    let elapsed_us = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "French amortization (fixed payment) reconciled against linked transactions and manual payments",
        terms,
        warnings,
        elapsed_us,
        LoanAnalysis {
            schedule: rows,
            aggregates,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger;
    use crate::schedule::{compute_schedule, LoanTerms, PaymentFrequency};
    use crate::types::AccountKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn loan_account() -> LoanAccount {
        LoanAccount {
            id: Uuid::new_v4(),
            name: "Mortgage".into(),
            kind: AccountKind::Loan,
            balance: dec!(12000),
            loan_details: LoanTerms {
                principal: dec!(12000),
                annual_rate_percent: dec!(0),
                term_months: 12,
                granting_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                first_payment_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                commissions_total: dec!(0),
                monthly_insurance: dec!(0),
                payment_frequency: PaymentFrequency::Monthly,
            },
            paid_installments: Default::default(),
            manual_payments: Vec::new(),
        }
    }

    fn income(account: &LoanAccount, amount: Decimal) -> LinkedTransaction {
        LinkedTransaction {
            id: Uuid::new_v4(),
            account_id: account.id,
            kind: TransactionKind::Income,
            amount,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            description: String::new(),
        }
    }

    // -----------------------------------------------------------------------
    // 1. Paid-to-date is the sum of income transactions and manual payments
    // -----------------------------------------------------------------------
    #[test]
    fn test_total_paid_to_date_composition() {
        let mut account = loan_account();
        ledger::register_manual_payment(
            &mut account,
            dec!(300),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            "",
        )
        .unwrap();

        let mut expense = income(&account, dec!(75));
        expense.kind = TransactionKind::Expense;
        let txs = vec![income(&account, dec!(1000)), income(&account, dec!(500)), expense];

        let schedule = compute_schedule(&account.loan_details, &account.paid_installments).unwrap();
        let aggregates = compute_aggregates(&account, &schedule, &txs);

        assert_eq!(aggregates.total_from_linked_transactions, dec!(1500));
        assert_eq!(aggregates.total_manual_payments, dec!(300));
        assert_eq!(aggregates.total_paid_to_date, dec!(1800));
        // 12 straight-line payments of 1000
        assert_eq!(aggregates.total_scheduled_payments, dec!(12000));
        assert_eq!(aggregates.projected_remaining_total, dec!(10200));
    }

    #[test]
    fn test_transactions_for_other_accounts_ignored() {
        let account = loan_account();
        let mut foreign = income(&account, dec!(999));
        foreign.account_id = Uuid::new_v4();

        let schedule = compute_schedule(&account.loan_details, &account.paid_installments).unwrap();
        let aggregates = compute_aggregates(&account, &schedule, &[foreign]);
        assert_eq!(aggregates.total_from_linked_transactions, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 2. Projected remaining total floors at zero on overpayment
    // -----------------------------------------------------------------------
    #[test]
    fn test_projected_remaining_floors_at_zero() {
        let account = loan_account();
        let txs = vec![income(&account, dec!(20000))];

        let schedule = compute_schedule(&account.loan_details, &account.paid_installments).unwrap();
        let aggregates = compute_aggregates(&account, &schedule, &txs);
        assert_eq!(aggregates.projected_remaining_total, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 3. Next due installment and liquidation state
    // -----------------------------------------------------------------------
    #[test]
    fn test_next_due_skips_paid_rows() {
        let mut account = loan_account();
        ledger::toggle_installment_paid(&mut account, 1).unwrap();
        ledger::toggle_installment_paid(&mut account, 2).unwrap();

        let schedule = compute_schedule(&account.loan_details, &account.paid_installments).unwrap();
        let aggregates = compute_aggregates(&account, &schedule, &[]);

        assert_eq!(aggregates.next_due_installment.unwrap().number, 3);
        assert!(!aggregates.is_liquidated);
        assert_eq!(aggregates.progress_ratio, dec!(2) / dec!(12));
    }

    #[test]
    fn test_all_paid_is_liquidated() {
        let mut account = loan_account();
        for n in 1..=12 {
            ledger::toggle_installment_paid(&mut account, n).unwrap();
        }

        let schedule = compute_schedule(&account.loan_details, &account.paid_installments).unwrap();
        let aggregates = compute_aggregates(&account, &schedule, &[]);

        assert!(aggregates.next_due_installment.is_none());
        assert!(aggregates.is_liquidated);
        assert_eq!(aggregates.progress_ratio, Decimal::ONE);
    }

    #[test]
    fn test_unchecking_reverts_liquidation() {
        let mut account = loan_account();
        for n in 1..=12 {
            ledger::toggle_installment_paid(&mut account, n).unwrap();
        }
        ledger::toggle_installment_paid(&mut account, 7).unwrap();

        let schedule = compute_schedule(&account.loan_details, &account.paid_installments).unwrap();
        let aggregates = compute_aggregates(&account, &schedule, &[]);
        assert_eq!(aggregates.next_due_installment.unwrap().number, 7);
        assert!(!aggregates.is_liquidated);
    }

    // -----------------------------------------------------------------------
    // 4. Aggregate consistency holds across mutation orderings
    // -----------------------------------------------------------------------
    #[test]
    fn test_paid_to_date_invariant_across_orderings() {
        let mut account = loan_account();
        let d = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let first = ledger::register_manual_payment(&mut account, dec!(200), d, "a").unwrap();
        ledger::register_manual_payment(&mut account, dec!(150), d, "b").unwrap();
        ledger::delete_manual_payment(&mut account, first).unwrap();
        ledger::register_manual_payment(&mut account, dec!(50), d, "c").unwrap();

        let txs = vec![income(&account, dec!(400))];
        let schedule = compute_schedule(&account.loan_details, &account.paid_installments).unwrap();
        let aggregates = compute_aggregates(&account, &schedule, &txs);

        assert_eq!(
            aggregates.total_paid_to_date,
            aggregates.total_from_linked_transactions + aggregates.total_manual_payments
        );
        assert_eq!(aggregates.total_manual_payments, dec!(200));
    }

    // -----------------------------------------------------------------------
    // 5. Analysis envelope: validation, warnings, liquidation display state
    // -----------------------------------------------------------------------
    #[test]
    fn test_analyze_loan_envelope() {
        let account = loan_account();
        let output = analyze_loan(&account, &[]).unwrap();

        assert_eq!(output.result.schedule.len(), 12);
        assert!(output.warnings.is_empty());
        assert!(output.methodology.contains("French amortization"));
    }

    #[test]
    fn test_analyze_warns_on_stale_paid_numbers() {
        let mut account = loan_account();
        ledger::toggle_installment_paid(&mut account, 40).unwrap();

        let output = analyze_loan(&account, &[]).unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("outside the schedule"));
    }

    #[test]
    fn test_analyze_warns_on_inflated_balance() {
        let mut account = loan_account();
        let d = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        // Clamped registration followed by an uncapped delete inflates the
        // balance above the principal.
        let big = ledger::register_manual_payment(&mut account, dec!(13000), d, "").unwrap();
        ledger::delete_manual_payment(&mut account, big).unwrap();
        assert!(account.balance > account.loan_details.principal);

        let output = analyze_loan(&account, &[]).unwrap();
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("exceeds the original principal")));
    }

    #[test]
    fn test_analyze_rejects_invalid_terms() {
        let mut account = loan_account();
        account.loan_details.term_months = 0;
        assert!(matches!(
            analyze_loan(&account, &[]),
            Err(DebtbookError::InvalidLoanTerms { .. })
        ));
    }
}
