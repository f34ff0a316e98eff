//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait. It orchestrates fee processing by coordinating
//! between the SyncReader (for CSV input) and FeeEngine (for business logic).
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Record opening and payment allocation to `FeeEngine`
//! - CSV output to `csv_format::write_ledger_csv`
//!
//! # Memory Efficiency
//!
//! Input rows are streamed one at a time; memory grows with the number of fee
//! records and their payment histories, not with the size of the input files.

use crate::config::LedgerConfig;
use crate::core::notify::LogNotifier;
use crate::core::{FeeEngine, FeeLedgerEngine};
use crate::io::csv_format::{write_ledger_csv, CsvRow, FeeRecordRow, PaymentRow};
use crate::io::sync_reader::SyncReader;
use crate::strategy::ProcessingStrategy;
use crate::types::{ErpError, FeeCommand};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// Reads the records file, then the payments file, through one `FeeEngine`.
///
/// # Examples
///
/// ```no_run
/// use campus_ledger::config::LedgerConfig;
/// use campus_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use chrono::Utc;
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::default(), Utc::now());
/// let mut output = io::stdout();
///
/// strategy
///     .process(Path::new("records.csv"), Path::new("payments.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy {
    ledger: LedgerConfig,
    as_of: DateTime<Utc>,
}

impl SyncProcessingStrategy {
    pub fn new(ledger: LedgerConfig, as_of: DateTime<Utc>) -> Self {
        Self { ledger, as_of }
    }
}

/// Stream the commands of one CSV file, logging rows that fail to parse
fn read_commands<C>(path: &Path) -> Result<impl Iterator<Item = FeeCommand>, ErpError>
where
    C: CsvRow<Output = FeeCommand>,
{
    let reader = SyncReader::<C>::new(path)?;
    Ok(reader.filter_map(|row| match row {
        Ok(command) => Some(command),
        Err(e) => {
            warn!("CSV parsing error: {}", e);
            None
        }
    }))
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process both files and write the ledger
    ///
    /// 1. Opens every fee record from the records file
    /// 2. Applies every payment in file order
    /// 3. Re-derives all statuses as of the configured instant
    /// 4. Writes the ledger using csv_format::write_ledger_csv
    ///
    /// # Error Handling
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Individual row and command errors are logged and processing continues.
    fn process(
        &self,
        records_path: &Path,
        payments_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), ErpError> {
        let mut engine = FeeEngine::new(self.ledger, Arc::new(LogNotifier));

        let opened = engine.process_all(read_commands::<FeeRecordRow>(records_path)?, self.as_of);
        let applied = engine.process_all(read_commands::<PaymentRow>(payments_path)?, self.as_of);
        info!(opened, applied, "Fee files processed");

        engine.refresh(self.as_of)?;
        write_ledger_csv(&engine.get_records(), output)?;

        Ok(())
    }
}
