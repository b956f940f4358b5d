use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::LoanTerms;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.01 = 1% per month). Never as percentages.
pub type Rate = Decimal;

/// Account kind. `Loan` tags the accounts the reconciler operates on; the
/// other variants exist so the loan / non-loan distinction is exhaustive
/// rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    Bank,
    Savings,
    Loan,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Bank => "bank",
            AccountKind::Savings => "savings",
            AccountKind::Loan => "loan",
        }
    }
}

/// An out-of-band payment entered directly against a loan's tracking record,
/// not flowing through the general transaction ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPayment {
    pub id: Uuid,
    pub amount: Money,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
}

/// A loan-bearing account. `balance` is the running outstanding capital,
/// owned exclusively by the reconciler; the amortization schedule is derived
/// from `loan_details` + `paid_installments` on every read and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAccount {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Money,
    pub loan_details: LoanTerms,
    #[serde(default)]
    pub paid_installments: std::collections::BTreeSet<u32>,
    #[serde(default)]
    pub manual_payments: Vec<ManualPayment>,
}

/// Direction of an ordinary ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// An ordinary ledger transaction whose account reference points at a loan
/// account. For loan accounts the sign convention is inverted relative to
/// asset accounts: `Income` pays the debt down, `Expense` increases it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
