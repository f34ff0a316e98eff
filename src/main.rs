//! Campus Ledger CLI
//!
//! Command-line interface for the fee ledger, grading, library circulation
//! and the JSON API.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- fees payments.csv --records records.csv > ledger.csv
//! cargo run -- fees --strategy sync --as-of 2024-09-30 payments.csv --records records.csv
//! cargo run -- fees --batch-size 2000 --max-concurrent 8 payments.csv --records records.csv
//! cargo run -- grades results.csv --zero-total incomplete > graded.csv
//! cargo run -- library events.csv --books books.csv > issues.csv
//! cargo run -- --log-level debug api requests.jsonl > responses.jsonl
//! ```
//!
//! Reports go to stdout; diagnostics go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use campus_ledger::{cli, commands, logging};
use std::process;

fn main() {
    let args = cli::parse_args();

    if let Err(e) = logging::init_logging(args.log_level.as_deref()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let mut output = std::io::stdout();
    if let Err(e) = commands::run(&args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
