//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. It processes fee commands in batches using
//! thread-based parallelism with fee-record-based partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (record partitioning + tasks)
//!     └── AsyncFeeEngine (thread-safe processing)
//!         └── AsyncFeeLedger (DashMap fee records)
//! ```
//!
//! # Thread-Based Parallelism
//!
//! - Batches are processed one after another, so a record's payments keep
//!   file order across batch boundaries
//! - Within a batch, commands are partitioned by fee record and each partition
//!   runs on its own tokio task
//! - The whole records file is applied before the first payment batch is read

use crate::config::LedgerConfig;
use crate::core::notify::LogNotifier;
use crate::core::r#async::{AsyncFeeEngine, AsyncFeeLedger, BatchProcessor};
use crate::core::FeeLedgerEngine;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::{write_ledger_csv, CsvRow, FeeRecordRow, PaymentRow};
use crate::io::sync_reader::open_input;
use crate::strategy::ProcessingStrategy;
use crate::types::{ErpError, FeeCommand};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info, warn};

/// Configuration for batch processing
///
/// Controls how commands are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// Produces the same ledger as [`super::SyncProcessingStrategy`] for the same
/// input files.
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    ledger: LedgerConfig,
    as_of: DateTime<Utc>,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `config` - BatchConfig with batch_size and max_concurrent_batches
    /// * `ledger` - Ledger policies
    /// * `as_of` - Instant the final statuses are derived at
    pub fn new(config: BatchConfig, ledger: LedgerConfig, as_of: DateTime<Utc>) -> Self {
        Self {
            config,
            ledger,
            as_of,
        }
    }

    /// Feed one CSV file through the batch processor, batch by batch
    async fn process_file<C>(&self, processor: &BatchProcessor, path: &Path) -> Result<usize, ErpError>
    where
        C: CsvRow<Output = FeeCommand> + 'static,
    {
        let file = tokio::fs::File::from_std(open_input(path)?);
        let mut reader = AsyncReader::<_, C>::new(file.compat());
        let mut applied = 0;

        loop {
            let batch = reader.read_batch(self.config.batch_size).await;
            if batch.is_empty() {
                break;
            }

            // Wait for the whole batch so later batches see its effects
            let results = processor.process_batch(batch, self.as_of).await;
            for outcome in results {
                match outcome.result {
                    Ok(()) => applied += 1,
                    Err(e) => warn!(record = ?outcome.command.record(), "Skipping fee command: {}", e),
                }
            }
        }

        debug!(path = %path.display(), applied, "Processed fee file");
        Ok(applied)
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Process both files and write the ledger
    ///
    /// 1. Creates a tokio multi-threaded runtime with the configured worker count
    /// 2. Opens every fee record, batch by batch
    /// 3. Applies every payment, batch by batch
    /// 4. Re-derives all statuses as of the configured instant
    /// 5. Writes the ledger using csv_format::write_ledger_csv
    ///
    /// # Error Handling
    ///
    /// Fatal errors (file not found, I/O errors, runtime errors) are returned immediately.
    /// Individual row and command errors are logged and processing continues.
    fn process(
        &self,
        records_path: &Path,
        payments_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), ErpError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| ErpError::internal(format!("Failed to create tokio runtime: {}", e)))?;

        runtime.block_on(async {
            let ledger = Arc::new(AsyncFeeLedger::new());
            let mut engine = AsyncFeeEngine::new(Arc::clone(&ledger), self.ledger, Arc::new(LogNotifier));
            let processor = BatchProcessor::new(engine.clone());

            let opened = self.process_file::<FeeRecordRow>(&processor, records_path).await?;
            let applied = self.process_file::<PaymentRow>(&processor, payments_path).await?;
            info!(opened, applied, "Fee files processed");

            engine.refresh(self.as_of)?;
            write_ledger_csv(&ledger.get_all_records(), output)?;

            Ok::<(), ErpError>(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RECORDS_HEADER: &str = "record,student,academic_year,semester,due_date,tuition,semester_fee,examination,library,laboratory,hostel,other\n";
    const PAYMENTS_HEADER: &str = "record,amount,method,date,transaction_id,remarks\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn strategy(config: BatchConfig) -> AsyncProcessingStrategy {
        let as_of = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        AsyncProcessingStrategy::new(config, LedgerConfig::default(), as_of)
    }

    #[test]
    fn test_async_strategy_applies_payments() {
        let records = create_temp_csv(&format!(
            "{}1,S1,2024-25,1,2024-09-01,15000,4000,1000,,,,\n2,S2,2024-25,1,2024-09-01,500,,,,,,\n",
            RECORDS_HEADER
        ));
        let payments = create_temp_csv(&format!(
            "{}1,5000,Cash,2024-07-10,,\n2,500,Online,2024-07-11,,\n",
            PAYMENTS_HEADER
        ));
        let mut output = Vec::new();

        strategy(BatchConfig::default())
            .process(records.path(), payments.path(), &mut output)
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "1,S1,2024-25,1,20000.00,5000.00,15000.00,0.00,Partial");
        assert_eq!(lines[2], "2,S2,2024-25,1,500.00,500.00,0.00,0.00,Paid");
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let records = create_temp_csv(RECORDS_HEADER);
        let mut output = Vec::new();

        let result = strategy(BatchConfig::default()).process(
            records.path(),
            Path::new("nonexistent.csv"),
            &mut output,
        );

        assert!(matches!(result, Err(ErpError::FileNotFound { .. })));
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        // Batches of two split both records' payments across batch boundaries
        let records = create_temp_csv(&format!(
            "{}1,S1,2024-25,1,2024-09-01,1000,,,,,,\n2,S2,2024-25,1,2024-09-01,100,,,,,,\n",
            RECORDS_HEADER
        ));
        let payments = create_temp_csv(&format!(
            "{}1,300,Cash,2024-07-01,,\n\
             2,50,Cash,2024-07-01,,\n\
             1,300,Cash,2024-07-02,,\n\
             2,25,Cash,2024-07-02,,\n\
             1,400,Cash,2024-07-03,,\n",
            PAYMENTS_HEADER
        ));
        let mut output = Vec::new();

        strategy(BatchConfig::new(2, num_cpus::get()))
            .process(records.path(), payments.path(), &mut output)
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let record1 = output.lines().find(|line| line.starts_with("1,")).unwrap();
        assert_eq!(record1, "1,S1,2024-25,1,1000.00,1000.00,0.00,0.00,Paid");
        let record2 = output.lines().find(|line| line.starts_with("2,")).unwrap();
        assert_eq!(record2, "2,S2,2024-25,1,100.00,75.00,25.00,0.00,Partial");
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);

        assert_eq!(config, BatchConfig::default());
    }
}
