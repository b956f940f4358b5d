use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::DebtbookError;
use crate::types::{Money, Rate};
use crate::DebtbookResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// How often installments fall due. Only monthly loans are supported; the
/// enum exists so the wire format does not regress to a free-form string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
}

/// Static terms of a loan. Immutable for the life of the loan except through
/// an explicit edit, which is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Original amount financed.
    pub principal: Money,
    /// Nominal annual interest rate, as a percentage (12 = 12%).
    pub annual_rate_percent: Decimal,
    /// Number of installments.
    pub term_months: u32,
    pub granting_date: NaiveDate,
    pub first_payment_date: NaiveDate,
    /// One-time fee, informational only; not amortized into the payment.
    #[serde(default)]
    pub commissions_total: Money,
    /// Flat add-on charged on every installment.
    #[serde(default)]
    pub monthly_insurance: Money,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
}

/// One row of the amortization schedule. Derived on every read, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position in the schedule.
    pub number: u32,
    pub due_date: NaiveDate,
    /// Fixed amortization payment plus monthly insurance.
    pub gross_payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// Capital outstanding after this installment, clamped at zero.
    pub remaining_balance: Money,
    pub is_paid: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check loan terms before any schedule computation. The calculator itself
/// assumes valid terms.
pub fn validate_terms(terms: &LoanTerms) -> DebtbookResult<()> {
    if terms.principal <= Decimal::ZERO {
        return Err(DebtbookError::InvalidLoanTerms {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if terms.annual_rate_percent < Decimal::ZERO {
        return Err(DebtbookError::InvalidLoanTerms {
            field: "annual_rate_percent".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    if terms.term_months == 0 {
        return Err(DebtbookError::InvalidLoanTerms {
            field: "term_months".into(),
            reason: "Term must be at least one month".into(),
        });
    }
    if terms.first_payment_date < terms.granting_date {
        return Err(DebtbookError::InvalidLoanTerms {
            field: "first_payment_date".into(),
            reason: "First payment date cannot precede the granting date".into(),
        });
    }
    if terms.commissions_total < Decimal::ZERO {
        return Err(DebtbookError::InvalidLoanTerms {
            field: "commissions_total".into(),
            reason: "Commissions cannot be negative".into(),
        });
    }
    if terms.monthly_insurance < Decimal::ZERO {
        return Err(DebtbookError::InvalidLoanTerms {
            field: "monthly_insurance".into(),
            reason: "Monthly insurance cannot be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Amortization calculator
// ---------------------------------------------------------------------------

/// Nominal monthly rate as a decimal (annual percent / 100 / 12).
pub fn monthly_rate(terms: &LoanTerms) -> Rate {
    terms.annual_rate_percent / PERCENT / MONTHS_PER_YEAR
}

/// Fixed payment under the French (constant-payment) amortization system,
/// before insurance. Falls back to straight-line for a zero rate.
///
/// The annuity factor grows exponentially with the term, so an extreme term
/// can leave Decimal's range even when the terms validate; that surfaces as
/// a typed overflow error instead of a panic.
pub fn fixed_payment(terms: &LoanTerms) -> DebtbookResult<Money> {
    let rate = monthly_rate(terms);
    if rate.is_zero() {
        return Ok(terms.principal / Decimal::from(terms.term_months));
    }
    // PMT = P * r(1 + r)^n / ((1 + r)^n - 1)
    let factor = (Decimal::ONE + rate)
        .checked_powu(u64::from(terms.term_months))
        .ok_or_else(|| DebtbookError::NumericOverflow {
            context: format!("annuity factor for a {}-month term", terms.term_months),
        })?;
    terms
        .principal
        .checked_mul(rate)
        .and_then(|p| p.checked_mul(factor))
        .and_then(|p| p.checked_div(factor - Decimal::ONE))
        .ok_or_else(|| DebtbookError::NumericOverflow {
            context: "fixed payment".into(),
        })
}

/// Compute the full installment schedule for a loan.
///
/// Pure and deterministic: re-invoked on every read so edits to the terms or
/// the paid set are reflected immediately. The recurrence carries the
/// unrounded Decimal balance end to end; rounding is left to presentation so
/// no error compounds across the schedule. Callers are expected to have run
/// [`validate_terms`] first; the only failure here is calendar overflow on a
/// due date.
pub fn compute_schedule(
    terms: &LoanTerms,
    paid_installments: &BTreeSet<u32>,
) -> DebtbookResult<Vec<Installment>> {
    let rate = monthly_rate(terms);
    let payment = fixed_payment(terms)?;

    let mut balance = terms.principal;
    let mut schedule = Vec::with_capacity(terms.term_months as usize);

    for number in 1..=terms.term_months {
        let due_date = terms
            .first_payment_date
            .checked_add_months(Months::new(number - 1))
            .ok_or_else(|| DebtbookError::DateOverflow {
                context: format!("due date of installment {number}"),
            })?;

        let interest = balance * rate;
        let principal_portion = payment - interest;
        balance -= principal_portion;

        // The final row absorbs the representational residue of the division
        // so the schedule closes at exactly zero.
        let remaining = if number == terms.term_months {
            Decimal::ZERO
        } else {
            balance.max(Decimal::ZERO)
        };

        schedule.push(Installment {
            number,
            due_date,
            gross_payment: payment + terms.monthly_insurance,
            principal_portion,
            interest_portion: interest,
            remaining_balance: remaining,
            is_paid: paid_installments.contains(&number),
        });
    }

    Ok(schedule)
}

/// Warnings about state the schedule silently tolerates: paid-installment
/// numbers that will never match a row. They can linger after a term is
/// edited downward and are stored untouched, so they are surfaced rather
/// than clamped.
pub fn stale_paid_warnings(terms: &LoanTerms, paid_installments: &BTreeSet<u32>) -> Vec<String> {
    paid_installments
        .iter()
        .filter(|&&n| n == 0 || n > terms.term_months)
        .map(|n| {
            format!(
                "Paid installment {} is outside the schedule (1..={}) and will never match a row",
                n, terms.term_months
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn base_terms() -> LoanTerms {
        LoanTerms {
            principal: dec!(12000),
            annual_rate_percent: dec!(12),
            term_months: 12,
            granting_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            first_payment_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            commissions_total: dec!(0),
            monthly_insurance: dec!(0),
            payment_frequency: PaymentFrequency::Monthly,
        }
    }

    fn paid(numbers: &[u32]) -> BTreeSet<u32> {
        numbers.iter().copied().collect()
    }

    // -----------------------------------------------------------------------
    // 1. Concrete scenario: 12000 at 12% over 12 months
    // -----------------------------------------------------------------------
    #[test]
    fn test_reference_schedule() {
        let terms = base_terms();
        let schedule = compute_schedule(&terms, &paid(&[])).unwrap();

        assert_eq!(schedule.len(), 12);

        // monthly rate 1%, PMT = 12000 * 0.01 * 1.01^12 / (1.01^12 - 1)
        let payment = fixed_payment(&terms).unwrap();
        assert!(
            (payment - dec!(1066.19)).abs() < dec!(0.01),
            "Fixed payment should be ~1066.19, got {payment}"
        );

        let first = &schedule[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.interest_portion, dec!(120.00));
        assert!(
            (first.principal_portion - dec!(946.19)).abs() < dec!(0.01),
            "First principal portion should be ~946.19, got {}",
            first.principal_portion
        );
        assert!(
            (first.remaining_balance - dec!(11053.81)).abs() < dec!(0.01),
            "Balance after first installment should be ~11053.81, got {}",
            first.remaining_balance
        );

        let last = schedule.last().unwrap();
        assert_eq!(last.number, 12);
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 2. Principal portions sum back to the principal
    // -----------------------------------------------------------------------
    #[test]
    fn test_principal_portions_sum_to_principal() {
        let mut terms = base_terms();
        terms.principal = dec!(250000);
        terms.annual_rate_percent = dec!(9.75);
        terms.term_months = 240;

        let schedule = compute_schedule(&terms, &paid(&[])).unwrap();
        let total_principal: Money = schedule.iter().map(|i| i.principal_portion).sum();

        assert!(
            (total_principal - terms.principal).abs() < dec!(0.01),
            "Principal portions sum {} should match principal {}",
            total_principal,
            terms.principal
        );
    }

    // -----------------------------------------------------------------------
    // 3. Remaining balance is non-increasing and closes at zero
    // -----------------------------------------------------------------------
    #[test]
    fn test_remaining_balance_monotonic() {
        let terms = base_terms();
        let schedule = compute_schedule(&terms, &paid(&[])).unwrap();

        let mut previous = terms.principal;
        for row in &schedule {
            assert!(
                row.remaining_balance <= previous,
                "Balance {} at installment {} exceeds previous {}",
                row.remaining_balance,
                row.number,
                previous
            );
            previous = row.remaining_balance;
        }
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 4. Zero rate degenerates to straight-line
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_rate_straight_line() {
        let mut terms = base_terms();
        terms.annual_rate_percent = dec!(0);

        let schedule = compute_schedule(&terms, &paid(&[])).unwrap();
        for row in &schedule {
            assert_eq!(row.principal_portion, dec!(1000));
            assert_eq!(row.interest_portion, Decimal::ZERO);
        }
    }

    // -----------------------------------------------------------------------
    // 5. Single-installment loan
    // -----------------------------------------------------------------------
    #[test]
    fn test_single_installment() {
        let mut terms = base_terms();
        terms.term_months = 1;
        terms.monthly_insurance = dec!(7.50);

        let schedule = compute_schedule(&terms, &paid(&[])).unwrap();
        assert_eq!(schedule.len(), 1);

        let only = &schedule[0];
        // principal * (1 + r) + insurance, r = 1%
        assert_eq!(only.gross_payment, dec!(12000) * dec!(1.01) + dec!(7.50));
        assert_eq!(only.remaining_balance, Decimal::ZERO);
        assert_eq!(only.due_date, terms.first_payment_date);
    }

    // -----------------------------------------------------------------------
    // 6. Insurance rides on top of the fixed payment
    // -----------------------------------------------------------------------
    #[test]
    fn test_insurance_added_to_gross_payment() {
        let mut terms = base_terms();
        terms.monthly_insurance = dec!(15);

        let schedule = compute_schedule(&terms, &paid(&[])).unwrap();
        let payment = fixed_payment(&terms).unwrap();
        for row in &schedule {
            assert_eq!(row.gross_payment, payment + dec!(15));
            // Insurance never leaks into the amortization split
            assert!(
                (row.principal_portion + row.interest_portion - payment).abs() < dec!(0.000001)
            );
        }
    }

    // -----------------------------------------------------------------------
    // 7. Due dates advance by calendar months with day clamping
    // -----------------------------------------------------------------------
    #[test]
    fn test_due_dates_month_end_clamping() {
        let mut terms = base_terms();
        terms.term_months = 3;
        terms.granting_date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        terms.first_payment_date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let schedule = compute_schedule(&terms, &paid(&[])).unwrap();
        let dates: Vec<NaiveDate> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            ]
        );
    }

    // -----------------------------------------------------------------------
    // 8. Paid flags come from the paid set, out-of-range numbers never match
    // -----------------------------------------------------------------------
    #[test]
    fn test_paid_flags_follow_paid_set() {
        let terms = base_terms();
        let schedule = compute_schedule(&terms, &paid(&[1, 3, 99])).unwrap();

        assert!(schedule[0].is_paid);
        assert!(!schedule[1].is_paid);
        assert!(schedule[2].is_paid);
        assert!(schedule.iter().all(|i| i.number != 99));

        let warnings = stale_paid_warnings(&terms, &paid(&[1, 3, 99]));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("99"));
    }

    // -----------------------------------------------------------------------
    // 9. Extreme terms overflow to a typed error, not a panic
    // -----------------------------------------------------------------------
    #[test]
    fn test_extreme_term_overflows_to_typed_error() {
        // 1.01^10000 leaves Decimal's range; the terms themselves validate.
        let mut terms = base_terms();
        terms.term_months = 10_000;
        assert!(validate_terms(&terms).is_ok());

        let err = fixed_payment(&terms).unwrap_err();
        assert!(matches!(err, DebtbookError::NumericOverflow { .. }));

        let err = compute_schedule(&terms, &paid(&[])).unwrap_err();
        assert!(matches!(err, DebtbookError::NumericOverflow { .. }));
    }

    // -----------------------------------------------------------------------
    // 10. Validation rejects malformed terms
    // -----------------------------------------------------------------------
    #[test]
    fn test_validation_rejections() {
        let mut terms = base_terms();
        terms.principal = dec!(0);
        assert!(validate_terms(&terms).is_err());

        let mut terms = base_terms();
        terms.term_months = 0;
        assert!(validate_terms(&terms).is_err());

        let mut terms = base_terms();
        terms.annual_rate_percent = dec!(-1);
        assert!(validate_terms(&terms).is_err());

        let mut terms = base_terms();
        terms.first_payment_date = terms.granting_date.pred_opt().unwrap();
        assert!(validate_terms(&terms).is_err());

        assert!(validate_terms(&base_terms()).is_ok());
    }
}
