use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use debtbook_core::aggregates;
use debtbook_core::ledger;
use debtbook_core::types::{LinkedTransaction, LoanAccount, TransactionKind};

use crate::input;

/// Arguments for the full loan analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the loan account JSON/YAML file
    #[arg(long)]
    pub account: String,

    /// Path to a JSON/YAML file with the transactions linked to the account
    #[arg(long)]
    pub transactions: Option<String>,
}

/// Arguments for toggling an installment checkmark
#[derive(Args)]
pub struct ToggleArgs {
    /// Path to the loan account JSON/YAML file
    #[arg(long)]
    pub account: String,

    /// Installment number to flip
    #[arg(long)]
    pub number: u32,

    /// Rewrite the account file in place instead of only printing it
    #[arg(long)]
    pub write: bool,
}

/// Arguments for registering a manual payment
#[derive(Args)]
pub struct PayArgs {
    /// Path to the loan account JSON/YAML file
    #[arg(long)]
    pub account: String,

    /// Payment amount (must be positive)
    #[arg(long)]
    pub amount: Decimal,

    /// Payment date (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Free-form note
    #[arg(long, default_value = "")]
    pub note: String,

    /// Rewrite the account file in place instead of only printing it
    #[arg(long)]
    pub write: bool,
}

/// Arguments for deleting a manual payment
#[derive(Args)]
pub struct DeletePaymentArgs {
    /// Path to the loan account JSON/YAML file
    #[arg(long)]
    pub account: String,

    /// Id of the manual payment to remove
    #[arg(long)]
    pub payment_id: Uuid,

    /// Rewrite the account file in place instead of only printing it
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TransactionDirection {
    /// Payment toward the debt (reduces the balance)
    Income,
    /// Charge against the loan (increases the balance)
    Expense,
}

impl From<&TransactionDirection> for TransactionKind {
    fn from(direction: &TransactionDirection) -> Self {
        match direction {
            TransactionDirection::Income => TransactionKind::Income,
            TransactionDirection::Expense => TransactionKind::Expense,
        }
    }
}

/// Arguments for applying or reverting a linked transaction
#[derive(Args)]
pub struct TransactionArgs {
    /// Path to the loan account JSON/YAML file
    #[arg(long)]
    pub account: String,

    /// Transaction direction
    #[arg(long)]
    pub kind: TransactionDirection,

    /// Transaction amount
    #[arg(long)]
    pub amount: Decimal,

    /// Transaction date (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Transaction id (defaults to a fresh one)
    #[arg(long)]
    pub id: Option<Uuid>,

    /// Free-form description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Rewrite the account file in place instead of only printing it
    #[arg(long)]
    pub write: bool,
}

impl TransactionArgs {
    fn to_transaction(&self, account: &LoanAccount) -> LinkedTransaction {
        LinkedTransaction {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            account_id: account.id,
            kind: (&self.kind).into(),
            amount: self.amount,
            date: self.date.unwrap_or_else(today),
            description: self.description.clone(),
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn load_account(path: &str) -> Result<LoanAccount, Box<dyn std::error::Error>> {
    input::file::read_document(path)
}

/// Print the updated account, rewriting the source file first when asked.
fn emit_account(
    path: &str,
    account: &LoanAccount,
    write: bool,
) -> Result<Value, Box<dyn std::error::Error>> {
    if write {
        input::file::write_json(path, account)?;
    }
    Ok(serde_json::to_value(account)?)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let account = load_account(&args.account)?;

    let transactions: Vec<LinkedTransaction> = if let Some(ref path) = args.transactions {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_piped_json()? {
        serde_json::from_value(data)?
    } else {
        Vec::new()
    };

    let output = aggregates::analyze_loan(&account, &transactions)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_toggle_paid(args: ToggleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut account = load_account(&args.account)?;
    ledger::toggle_installment_paid(&mut account, args.number)?;
    emit_account(&args.account, &account, args.write)
}

pub fn run_pay(args: PayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut account = load_account(&args.account)?;
    let payment_id = ledger::register_manual_payment(
        &mut account,
        args.amount,
        args.date.unwrap_or_else(today),
        &args.note,
    )?;

    if args.write {
        input::file::write_json(&args.account, &account)?;
    }
    Ok(serde_json::json!({
        "payment_id": payment_id,
        "account": account,
    }))
}

pub fn run_delete_payment(args: DeletePaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut account = load_account(&args.account)?;
    ledger::delete_manual_payment(&mut account, args.payment_id)?;
    emit_account(&args.account, &account, args.write)
}

pub fn run_apply_tx(args: TransactionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut account = load_account(&args.account)?;
    let tx = args.to_transaction(&account);
    ledger::apply_transaction(&mut account, &tx)?;
    emit_account(&args.account, &account, args.write)
}

pub fn run_revert_tx(args: TransactionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut account = load_account(&args.account)?;
    let tx = args.to_transaction(&account);
    ledger::revert_transaction(&mut account, &tx)?;
    emit_account(&args.account, &account, args.write)
}
