use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Instant;

use debtbook_core::schedule::{self, LoanTerms, PaymentFrequency};
use debtbook_core::types::with_metadata;

use crate::input;

/// Arguments for schedule computation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
    /// Path to a JSON/YAML file with the loan terms (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Original amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate, percent (12 = 12%)
    #[arg(long, alias = "rate")]
    pub annual_rate_percent: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,

    /// Date the loan was granted (defaults to the first payment date)
    #[arg(long)]
    pub granting_date: Option<NaiveDate>,

    /// Due date of the first installment
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,

    /// One-time commissions, informational
    #[arg(long)]
    pub commissions_total: Option<Decimal>,

    /// Flat insurance add-on per installment
    #[arg(long, alias = "insurance")]
    pub monthly_insurance: Option<Decimal>,

    /// Installment numbers already checked off (repeatable)
    #[arg(long = "paid")]
    pub paid: Vec<u32>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_piped_json()? {
        serde_json::from_value(data)?
    } else {
        let first_payment_date = args
            .first_payment_date
            .ok_or("--first-payment-date is required (or provide --input)")?;
        LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args
                .annual_rate_percent
                .ok_or("--annual-rate-percent is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            granting_date: args.granting_date.unwrap_or(first_payment_date),
            first_payment_date,
            commissions_total: args.commissions_total.unwrap_or_default(),
            monthly_insurance: args.monthly_insurance.unwrap_or_default(),
            payment_frequency: PaymentFrequency::Monthly,
        }
    };

    let paid: BTreeSet<u32> = args.paid.iter().copied().collect();

    let start = Instant::now();
    schedule::validate_terms(&terms)?;
    let warnings = schedule::stale_paid_warnings(&terms, &paid);
    let rows = schedule::compute_schedule(&terms, &paid)?;
    let elapsed_us = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "French amortization (fixed payment)",
        &terms,
        warnings,
        elapsed_us,
        rows,
    );
    Ok(serde_json::to_value(output)?)
}
