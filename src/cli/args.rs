use crate::config::{AllocationOrder, CirculationPolicy, LedgerConfig, ZeroTotalPolicy};
use crate::io::csv_format::parse_timestamp;
use crate::strategy::BatchConfig;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// College ledger: fee collection, grading, library circulation
#[derive(Parser, Debug)]
#[command(name = "campus-ledger")]
#[command(about = "Fee ledger, grading and library circulation for a college ERP", long_about = None)]
pub struct CliArgs {
    /// Log filter directive, e.g. `info` or `campus_ledger=debug`
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        global = true,
        help = "Log filter for stderr diagnostics (default: RUST_LOG, then warn)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a payments file to fee records and print the ledger
    Fees(FeesArgs),
    /// Grade a results file and print the graded results
    Grades(GradesArgs),
    /// Replay library events against a catalogue and print the issue records
    Library(LibraryArgs),
    /// Answer JSON-lines API requests, one response envelope per line
    Api(ApiArgs),
}

#[derive(Args, Debug)]
pub struct FeesArgs {
    /// Payments CSV file
    #[arg(value_name = "PAYMENTS", help = "Path to the payments CSV file")]
    pub payments_file: PathBuf,

    /// Fee records CSV file
    #[arg(long = "records", value_name = "RECORDS", help = "Path to the fee records CSV file")]
    pub records_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Instant statuses are derived at
    #[arg(long = "as-of", value_name = "DATE", value_parser = parse_instant, help = "RFC 3339 or YYYY-MM-DD (default: now)")]
    pub as_of: Option<DateTime<Utc>>,

    /// Order payments are spread across fee heads
    #[arg(long = "allocation", value_name = "ORDER", default_value = "full")]
    pub allocation: AllocationOrder,

    /// Reject payments larger than the outstanding balance
    #[arg(long = "reject-overpayment")]
    pub reject_overpayment: bool,
}

#[derive(Args, Debug)]
pub struct GradesArgs {
    /// Results CSV file
    #[arg(value_name = "RESULTS", help = "Path to the results CSV file")]
    pub results_file: PathBuf,

    /// Grading of a result whose maximum marks are zero
    #[arg(long = "zero-total", value_name = "POLICY", default_value = "fail")]
    pub zero_total: ZeroTotalPolicy,
}

#[derive(Args, Debug)]
pub struct LibraryArgs {
    /// Library events CSV file
    #[arg(value_name = "EVENTS", help = "Path to the library events CSV file")]
    pub events_file: PathBuf,

    /// Book catalogue CSV file
    #[arg(long = "books", value_name = "BOOKS", help = "Path to the books CSV file")]
    pub books_file: PathBuf,

    /// Fine per started overdue day
    #[arg(long = "fine-per-day", value_name = "AMOUNT")]
    pub fine_per_day: Option<Decimal>,

    /// Loan period in days when an issue names no due date
    #[arg(long = "loan-days", value_name = "DAYS")]
    pub loan_days: Option<i64>,

    /// Instant outstanding loans are checked for being overdue
    #[arg(long = "as-of", value_name = "DATE", value_parser = parse_instant)]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct ApiArgs {
    /// JSON-lines request file
    #[arg(value_name = "REQUESTS", help = "Path to the JSON-lines request file")]
    pub requests_file: PathBuf,

    /// Salt mixed into password hashes
    #[arg(long = "salt", value_name = "SALT", default_value = "campus-ledger")]
    pub salt: String,
}

/// Available processing strategies for fee files
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value).map_err(|e| e.to_string())
}

impl FeesArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Values not given on the command line fall back to the defaults; zero
    /// values fall back with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            allocation_order: self.allocation,
            reject_overpayment: self.reject_overpayment,
            ..LedgerConfig::default()
        }
    }
}

impl LibraryArgs {
    pub fn to_policy(&self) -> CirculationPolicy {
        let default = CirculationPolicy::default();
        CirculationPolicy {
            fine_per_day: self.fine_per_day.unwrap_or(default.fine_per_day),
            loan_days: self.loan_days.unwrap_or(default.loan_days),
            ..default
        }
    }
}
