//! Loan amortization and debt-ledger reconciliation.
//!
//! Two cooperating pieces: [`schedule`] turns a loan's static terms into a
//! French-amortization installment schedule (pure, recomputed on every read),
//! and [`ledger`] keeps a loan account's capital balance, paid checkmarks and
//! manual payments consistent under mutation. [`aggregates`] reconciles the
//! two with the ordinary transactions linked to the account.
//!
//! All money arithmetic is `rust_decimal::Decimal`; persistence and UI are
//! the caller's concern.

pub mod aggregates;
pub mod error;
pub mod ledger;
pub mod schedule;
pub mod types;

pub use aggregates::{analyze_loan, compute_aggregates, DebtAggregates, LoanAnalysis};
pub use error::DebtbookError;
pub use schedule::{compute_schedule, validate_terms, Installment, LoanTerms, PaymentFrequency};
pub use types::*;

/// Standard result type for all debtbook operations
pub type DebtbookResult<T> = Result<T, DebtbookError>;
