//! Subcommand runners
//!
//! Each runner reads its input files, drives the matching component and
//! writes its report to `output`. Rows and events that fail are logged at
//! `warn` and skipped; only missing or unreadable files are fatal.

use crate::api::{serve_lines, AppState};
use crate::cli::{ApiArgs, CliArgs, Command, FeesArgs, GradesArgs, LibraryArgs, StrategyType};
use crate::config::LedgerConfig;
use crate::core::notify::LogNotifier;
use crate::core::{Library, ResultsBook};
use crate::io::csv_format::{write_issues_csv, write_results_csv, BookRow, LibraryEventRow, ResultRow};
use crate::io::sync_reader::{open_input, SyncReader};
use crate::strategy;
use crate::types::ErpError;
use chrono::Utc;
use std::io::{BufReader, Write};
use std::sync::Arc;
use tracing::{info, warn};

/// Run the selected subcommand
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), ErpError> {
    match &args.command {
        Command::Fees(fees) => run_fees(fees, output),
        Command::Grades(grades) => run_grades(grades, output),
        Command::Library(library) => run_library(library, output),
        Command::Api(api) => run_api(api, output),
    }
}

pub fn run_fees(args: &FeesArgs, output: &mut dyn Write) -> Result<(), ErpError> {
    let config = if args.strategy == StrategyType::Async {
        Some(args.to_batch_config())
    } else {
        None
    };
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let strategy = strategy::create_strategy(
        args.strategy.clone(),
        args.to_ledger_config(),
        as_of,
        config,
    );

    strategy.process(&args.records_file, &args.payments_file, output)
}

pub fn run_grades(args: &GradesArgs, output: &mut dyn Write) -> Result<(), ErpError> {
    let mut book = ResultsBook::new(args.zero_total, Arc::new(LogNotifier));
    let mut graded = 0;

    for row in SyncReader::<ResultRow>::new(&args.results_file)? {
        let outcome = row.and_then(|entry| book.upsert(&entry));
        match outcome {
            Ok(_) => graded += 1,
            Err(e) => warn!("Skipping result: {}", e),
        }
    }
    info!(graded, "Results graded");

    write_results_csv(book.results(), output)
}

pub fn run_library(args: &LibraryArgs, output: &mut dyn Write) -> Result<(), ErpError> {
    let mut library = Library::new(args.to_policy(), Arc::new(LogNotifier));

    for row in SyncReader::<BookRow>::new(&args.books_file)? {
        if let Err(e) = row.and_then(|book| library.add_book(book).map(|_| ())) {
            warn!("Skipping book: {}", e);
        }
    }

    let mut applied = 0;
    for row in SyncReader::<LibraryEventRow>::new(&args.events_file)? {
        match row.and_then(|(at, event)| library.apply(event, at)) {
            Ok(_) => applied += 1,
            Err(e) => warn!("Skipping library event: {}", e),
        }
    }
    if let Some(as_of) = args.as_of {
        library.refresh_overdue(as_of);
    }
    info!(applied, "Library events applied");

    write_issues_csv(library.issues(), output)
}

pub fn run_api(args: &ApiArgs, output: &mut dyn Write) -> Result<(), ErpError> {
    let input = BufReader::new(open_input(&args.requests_file)?);
    let mut state = AppState::new(LedgerConfig::default(), args.salt.as_str(), Arc::new(LogNotifier));

    let answered = serve_lines(&mut state, input, output)?;
    info!(answered, "API requests answered");
    Ok(())
}
