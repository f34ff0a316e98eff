//! Core traits for fee ledger engines
//!
//! This module defines the trait abstraction that lets the sequential and the
//! concurrent fee engines be driven by the same pipeline code.

use crate::types::{ErpError, FeeCommand, FeeRecord};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Trait for applying ledger commands
///
/// Implemented by the single-threaded `FeeEngine` and the DashMap-backed
/// `AsyncFeeEngine`.
pub trait FeeLedgerEngine {
    /// Apply a single command
    ///
    /// `now` stamps newly opened records and is the reference time for their
    /// first status derivation. Payments derive as of their own payment date.
    fn process(&mut self, command: FeeCommand, now: DateTime<Utc>) -> Result<(), ErpError>;

    /// Re-derive every record as of `now`
    fn refresh(&mut self, now: DateTime<Utc>) -> Result<(), ErpError>;

    /// Snapshot of all records, sorted by id
    fn get_records(&self) -> Vec<FeeRecord>;

    /// Apply commands in order, skipping the ones that fail
    ///
    /// Failures are logged and do not stop the run.
    ///
    /// # Returns
    ///
    /// The number of commands applied successfully
    fn process_all<I>(&mut self, commands: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = FeeCommand>,
        Self: Sized,
    {
        let mut applied = 0;
        for command in commands {
            let record = command.record();
            match self.process(command, now) {
                Ok(()) => applied += 1,
                Err(e) => warn!(record = ?record, "Skipping fee command: {}", e),
            }
        }
        applied
    }
}
