//! Processing strategy module for bulk fee files
//!
//! This module defines the Strategy pattern for complete fee processing pipelines,
//! encompassing both CSV parsing and fee engine processing. This allows different
//! processing implementations (synchronous, asynchronous batch) to be selected at runtime.

use crate::cli::StrategyType;
use crate::config::LedgerConfig;
use crate::types::ErpError;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete fee processing pipelines
///
/// Each strategy reads fee records and then payments from CSV files, applies
/// them through its fee engine, and writes the resulting ledger.
pub trait ProcessingStrategy: Send + Sync {
    /// Process a records file and a payments file and write the ledger
    ///
    /// # Arguments
    ///
    /// * `records_path` - CSV file of fee records to open
    /// * `payments_path` - CSV file of payments, applied in file order per record
    /// * `output` - Writer receiving the ledger CSV
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either input file cannot be opened
    /// - A fatal I/O error occurs during reading or writing
    ///
    /// Rows that fail to parse and commands the ledger rejects are logged at
    /// `warn` and skipped; they never fail the run.
    fn process(
        &self,
        records_path: &Path,
        payments_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), ErpError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `ledger` - Ledger policies both strategies apply
/// * `as_of` - Instant the final statuses are derived at
/// * `config` - Optional configuration for async batch processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    ledger: LedgerConfig,
    as_of: DateTime<Utc>,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger, as_of)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, ledger, as_of))
        }
    }
}
