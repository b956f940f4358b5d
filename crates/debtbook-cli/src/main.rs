mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::ledger::{
    AnalyzeArgs, DeletePaymentArgs, PayArgs, ToggleArgs, TransactionArgs,
};
use commands::schedule::ScheduleArgs;

/// Loan amortization and debt-ledger bookkeeping
#[derive(Parser)]
#[command(
    name = "dbk",
    version,
    about = "Loan amortization schedules and debt-ledger bookkeeping",
    long_about = "Computes French-amortization payment schedules with decimal precision and \
                  reconciles a loan account's capital balance against installment checkmarks, \
                  linked ledger transactions, and manual payments. Mutating commands print \
                  the updated account record; storing it durably is up to you."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the installment schedule for a set of loan terms
    Schedule(ScheduleArgs),
    /// Full loan analysis: schedule plus reconciled aggregates
    Analyze(AnalyzeArgs),
    /// Flip the paid checkmark of one installment
    TogglePaid(ToggleArgs),
    /// Register a manual payment against the loan
    Pay(PayArgs),
    /// Delete a manual payment, restoring its amount to the balance
    DeletePayment(DeletePaymentArgs),
    /// Apply the balance effect of a linked transaction
    ApplyTx(TransactionArgs),
    /// Undo the balance effect of a linked transaction
    RevertTx(TransactionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Analyze(args) => commands::ledger::run_analyze(args),
        Commands::TogglePaid(args) => commands::ledger::run_toggle_paid(args),
        Commands::Pay(args) => commands::ledger::run_pay(args),
        Commands::DeletePayment(args) => commands::ledger::run_delete_payment(args),
        Commands::ApplyTx(args) => commands::ledger::run_apply_tx(args),
        Commands::RevertTx(args) => commands::ledger::run_revert_tx(args),
        Commands::Version => {
            println!("dbk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
