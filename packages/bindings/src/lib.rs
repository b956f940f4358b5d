use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;
use std::collections::BTreeSet;

use debtbook_core::types::{LinkedTransaction, LoanAccount};
use debtbook_core::{ledger, schedule, LoanTerms};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScheduleRequest {
    terms: LoanTerms,
    #[serde(default)]
    paid_installments: BTreeSet<u32>,
}

#[napi]
pub fn compute_schedule(input_json: String) -> NapiResult<String> {
    let request: ScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    schedule::validate_terms(&request.terms).map_err(to_napi_error)?;
    let rows = schedule::compute_schedule(&request.terms, &request.paid_installments)
        .map_err(to_napi_error)?;
    serde_json::to_string(&rows).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct AnalysisRequest {
    account: LoanAccount,
    #[serde(default)]
    transactions: Vec<LinkedTransaction>,
}

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let request: AnalysisRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = debtbook_core::analyze_loan(&request.account, &request.transactions)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ledger mutations
// ---------------------------------------------------------------------------

#[napi]
pub fn toggle_installment_paid(account_json: String, number: u32) -> NapiResult<String> {
    let mut account: LoanAccount = serde_json::from_str(&account_json).map_err(to_napi_error)?;
    ledger::toggle_installment_paid(&mut account, number).map_err(to_napi_error)?;
    serde_json::to_string(&account).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ManualPaymentRequest {
    account: LoanAccount,
    amount: rust_decimal::Decimal,
    date: chrono::NaiveDate,
    #[serde(default)]
    note: String,
}

#[napi]
pub fn register_manual_payment(input_json: String) -> NapiResult<String> {
    let mut request: ManualPaymentRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment_id = ledger::register_manual_payment(
        &mut request.account,
        request.amount,
        request.date,
        &request.note,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({
        "payment_id": payment_id,
        "account": request.account,
    }))
    .map_err(to_napi_error)
}

#[derive(Deserialize)]
struct DeletePaymentRequest {
    account: LoanAccount,
    payment_id: uuid::Uuid,
}

#[napi]
pub fn delete_manual_payment(input_json: String) -> NapiResult<String> {
    let mut request: DeletePaymentRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    ledger::delete_manual_payment(&mut request.account, request.payment_id)
        .map_err(to_napi_error)?;
    serde_json::to_string(&request.account).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct TransactionRequest {
    account: LoanAccount,
    transaction: LinkedTransaction,
}

#[napi]
pub fn apply_transaction(input_json: String) -> NapiResult<String> {
    let mut request: TransactionRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    ledger::apply_transaction(&mut request.account, &request.transaction)
        .map_err(to_napi_error)?;
    serde_json::to_string(&request.account).map_err(to_napi_error)
}

#[napi]
pub fn revert_transaction(input_json: String) -> NapiResult<String> {
    let mut request: TransactionRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    ledger::revert_transaction(&mut request.account, &request.transaction)
        .map_err(to_napi_error)?;
    serde_json::to_string(&request.account).map_err(to_napi_error)
}
