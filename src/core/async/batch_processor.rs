//! Batch processing with record-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which manages concurrent
//! batch processing with fee-record-based partitioning: commands for different
//! records run in parallel while each record sees its own commands in input
//! order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── AsyncFeeEngine   (cloned into one task per record)
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::error;

use super::AsyncFeeEngine;
use crate::core::traits::FeeLedgerEngine;
use crate::types::{ErpError, FeeCommand, FeeRecordId};

/// Result of processing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was processed
    pub command: FeeCommand,

    /// The result of processing (success or error)
    pub result: Result<(), ErpError>,
}

/// Batch processor with record-based partitioning
#[derive(Clone)]
pub struct BatchProcessor {
    engine: AsyncFeeEngine,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine cloned into every spawned task; all clones share one ledger
    pub fn new(engine: AsyncFeeEngine) -> Self {
        Self { engine }
    }

    /// Partition a batch of commands by target fee record
    ///
    /// Drafts without an explicit id share the `None` partition.
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one partition
    /// - Commands within a partition keep their original order
    pub fn partition_by_record(
        &self,
        batch: Vec<FeeCommand>,
    ) -> HashMap<Option<FeeRecordId>, Vec<FeeCommand>> {
        let mut partitions: HashMap<Option<FeeRecordId>, Vec<FeeCommand>> = HashMap::new();

        for command in batch {
            partitions.entry(command.record()).or_default().push(command);
        }

        partitions
    }

    /// Process one partition sequentially
    ///
    /// All commands are processed even if some fail. Results are in input order.
    pub async fn process_record_commands(
        &self,
        commands: Vec<FeeCommand>,
        now: DateTime<Utc>,
    ) -> Vec<ProcessingResult> {
        let mut engine = self.engine.clone();
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = engine.process(command.clone(), now);
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Process a batch with one tokio task per fee record
    ///
    /// # Returns
    ///
    /// The outcome of every command. Results of different records may be
    /// interleaved in any order.
    pub async fn process_batch(
        &self,
        batch: Vec<FeeCommand>,
        now: DateTime<Utc>,
    ) -> Vec<ProcessingResult> {
        let partitions = self.partition_by_record(batch);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_record, commands) in partitions {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_record_commands(commands, now).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(record_results) => results.extend(record_results),
                Err(e) => error!("Fee processing task failed: {}", e),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::core::notify::LogNotifier;
    use crate::core::r#async::AsyncFeeLedger;
    use crate::types::{FeeRecordDraft, FeeSchedule, PaymentMethod, PaymentRequest};
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap()
    }

    fn processor() -> (BatchProcessor, AsyncFeeEngine) {
        let engine = AsyncFeeEngine::new(
            Arc::new(AsyncFeeLedger::new()),
            LedgerConfig::default(),
            Arc::new(LogNotifier),
        );
        (BatchProcessor::new(engine.clone()), engine)
    }

    fn open(id: FeeRecordId) -> FeeCommand {
        FeeCommand::Open(FeeRecordDraft {
            id: Some(id),
            student: format!("S{}", id),
            academic_year: "2024-25".to_string(),
            semester: 1,
            due_date: None,
            fees: FeeSchedule {
                tuition: Decimal::new(300, 0),
                semester: Decimal::new(200, 0),
                ..FeeSchedule::default()
            },
        })
    }

    fn pay(record: FeeRecordId, amount: i64) -> FeeCommand {
        FeeCommand::Pay(PaymentRequest {
            record,
            amount: Decimal::new(amount, 0),
            payment_method: PaymentMethod::Cheque,
            paid_at: now(),
            transaction_id: None,
            bank_details: None,
            remarks: None,
        })
    }

    #[test]
    fn test_partition_by_record_keeps_order() {
        let (processor, _) = processor();
        let batch = vec![open(1), open(2), pay(1, 10), pay(2, 20), pay(1, 30)];

        let partitions = processor.partition_by_record(batch);

        assert_eq!(partitions.len(), 2);
        assert_eq!(
            partitions[&Some(1)],
            vec![open(1), pay(1, 10), pay(1, 30)]
        );
        assert_eq!(partitions[&Some(2)], vec![open(2), pay(2, 20)]);
    }

    #[test]
    fn test_partition_groups_drafts_without_id() {
        let (processor, _) = processor();
        let mut draft = open(1);
        if let FeeCommand::Open(ref mut inner) = draft {
            inner.id = None;
        }

        let partitions = processor.partition_by_record(vec![draft.clone(), pay(1, 5)]);

        assert_eq!(partitions[&None], vec![draft]);
        assert_eq!(partitions[&Some(1)].len(), 1);
    }

    #[tokio::test]
    async fn test_process_record_commands_continues_after_error() {
        let (processor, engine) = processor();

        let results = processor
            .process_record_commands(vec![pay(1, 10), open(1), pay(1, 0), pay(1, 350)], now())
            .await;

        assert_eq!(results.len(), 4);
        assert!(matches!(results[0].result, Err(ErpError::FeeRecordNotFound { .. })));
        assert!(results[1].result.is_ok());
        assert!(matches!(results[2].result, Err(ErpError::InvalidAmount { .. })));
        assert!(results[3].result.is_ok());

        let record = engine.get(1).unwrap();
        assert_eq!(record.fees.tuition_fee.due, Decimal::ZERO);
        assert_eq!(record.fees.semester_fee.paid, Decimal::new(50, 0));
    }

    #[tokio::test]
    async fn test_process_batch_many_records() {
        let (processor, engine) = processor();
        let mut batch = Vec::new();
        for id in 1..=20 {
            batch.push(open(id));
        }
        for id in 1..=20 {
            batch.push(pay(id, 100));
            batch.push(pay(id, 400));
        }

        let results = processor.process_batch(batch, now()).await;

        assert_eq!(results.len(), 60);
        assert!(results.iter().all(|r| r.result.is_ok()));
        let records = engine.get_records();
        assert_eq!(records.len(), 20);
        assert!(records.iter().all(|r| r.total_due == Decimal::ZERO));
        // Sorted snapshot
        assert_eq!(records.first().map(|r| r.id), Some(1));
        assert_eq!(records.last().map(|r| r.id), Some(20));
    }
}
