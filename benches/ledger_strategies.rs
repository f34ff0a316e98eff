//! Benchmark suite for comparing fee processing strategies
//!
//! This benchmark compares the synchronous and asynchronous strategies over
//! the same records and payments files using the divan benchmarking
//! framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Benchmark Fixtures
//!
//! Each dataset is a records file plus a payments file with three payments
//! per record:
//! - `small` - 100 records
//! - `medium` - 1,000 records
//! - `large` - 20,000 records
//!
//! Records mix optional fee heads, other fees and due dates on either side
//! of the reference instant.

use campus_ledger::cli::StrategyType;
use campus_ledger::config::LedgerConfig;
use campus_ledger::strategy::{create_strategy, BatchConfig};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;

fn main() {
    divan::main();
}

const DATASETS: &[&str] = &["small", "medium", "large"];

fn run(strategy_type: StrategyType, dataset: &str) {
    let config = match strategy_type {
        StrategyType::Async => Some(BatchConfig::default()),
        StrategyType::Sync => None,
    };
    let as_of = Utc.with_ymd_and_hms(2024, 8, 15, 0, 0, 0).unwrap();
    let strategy = create_strategy(strategy_type, LedgerConfig::default(), as_of, config);

    let records = PathBuf::from(format!("benches/fixtures/{}_records.csv", dataset));
    let payments = PathBuf::from(format!("benches/fixtures/{}_payments.csv", dataset));
    let mut output = Vec::new();

    strategy
        .process(&records, &payments, &mut output)
        .expect("Processing failed");
}

#[divan::bench(args = DATASETS)]
fn sync_strategy(dataset: &str) {
    run(StrategyType::Sync, dataset);
}

#[divan::bench(args = DATASETS)]
fn async_strategy(dataset: &str) {
    run(StrategyType::Async, dataset);
}
