//! Fee processing orchestration for concurrent batch processing
//!
//! This module provides the `AsyncFeeEngine` struct, which applies the same
//! business rules as the sequential `FeeEngine` on top of the thread-safe
//! `AsyncFeeLedger`.
//!
//! # Architecture
//!
//! ```text
//! AsyncFeeEngine
//!     ├── Arc<AsyncFeeLedger>     (thread-safe fee records)
//!     ├── Arc<ReceiptGenerator>   (shared monotonic identifiers)
//!     └── Arc<dyn Notifier>       (payment notifications)
//! ```
//!
//! # Thread Safety
//!
//! The engine is cheap to clone and every clone shares the same ledger and
//! identifier source, so clones can be handed to separate tokio tasks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::AsyncFeeLedger;
use crate::config::LedgerConfig;
use crate::core::engine::{payment_notification, receipt_for};
use crate::core::fee_ledger::FeeOverview;
use crate::core::notify::{deliver, Notifier};
use crate::core::receipt::ReceiptGenerator;
use crate::core::traits::FeeLedgerEngine;
use crate::types::{
    ErpError, FeeCommand, FeeRecord, FeeRecordDraft, FeeRecordId, PaymentReceipt, PaymentRequest,
};

/// Fee processing orchestrator for concurrent processing
#[derive(Clone)]
pub struct AsyncFeeEngine {
    ledger: Arc<AsyncFeeLedger>,
    receipts: Arc<ReceiptGenerator>,
    config: LedgerConfig,
    notifier: Arc<dyn Notifier>,
}

impl AsyncFeeEngine {
    /// Create a new AsyncFeeEngine
    ///
    /// # Arguments
    ///
    /// * `ledger` - Arc-wrapped AsyncFeeLedger shared by every clone
    /// * `config` - Allocation order and overpayment policy
    /// * `notifier` - Channel for payment notifications
    pub fn new(ledger: Arc<AsyncFeeLedger>, config: LedgerConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger,
            receipts: Arc::new(ReceiptGenerator::new()),
            config,
            notifier,
        }
    }

    /// Open a fee record
    ///
    /// # Returns
    ///
    /// A snapshot of the derived record
    pub fn open_record(&self, draft: FeeRecordDraft, now: DateTime<Utc>) -> Result<FeeRecord, ErpError> {
        let record = self.ledger.open(draft, now)?;
        debug!(record = record.id, "Opened fee record");
        Ok(record)
    }

    /// Record a payment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is zero or negative
    /// - The fee record does not exist
    /// - Overpayments are rejected and the amount exceeds the allocatable due
    pub fn record_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt, ErpError> {
        if request.amount <= Decimal::ZERO {
            return Err(ErpError::invalid_amount(request.amount));
        }
        if self.ledger.get(request.record).is_none() {
            return Err(ErpError::fee_record_not_found(request.record));
        }

        let receipts = &self.receipts;
        let issue_ids = || receipts.next(request.paid_at);
        let (payment, record) = self.ledger.record_payment(request, issue_ids, &self.config)?;
        let receipt = receipt_for(&record, payment);

        debug!(
            record = receipt.record,
            payment = %receipt.payment.payment_id,
            status = %receipt.overall_status,
            "Recorded payment"
        );
        deliver(self.notifier.as_ref(), payment_notification(&receipt));

        Ok(receipt)
    }

    pub fn get(&self, id: FeeRecordId) -> Option<FeeRecord> {
        self.ledger.get(id)
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Result<FeeOverview, ErpError> {
        self.ledger.overview(now)
    }
}

impl FeeLedgerEngine for AsyncFeeEngine {
    fn process(&mut self, command: FeeCommand, now: DateTime<Utc>) -> Result<(), ErpError> {
        match command {
            FeeCommand::Open(draft) => self.open_record(draft, now).map(|_| ()),
            FeeCommand::Pay(request) => self.record_payment(&request).map(|_| ()),
        }
    }

    fn refresh(&mut self, now: DateTime<Utc>) -> Result<(), ErpError> {
        self.ledger.refresh(now)
    }

    fn get_records(&self) -> Vec<FeeRecord> {
        self.ledger.get_all_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::testing::RecordingNotifier;
    use crate::types::{FeeSchedule, OverallStatus, PaymentMethod};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 20, 11, 0, 0).unwrap()
    }

    fn engine(notifier: Arc<RecordingNotifier>) -> AsyncFeeEngine {
        AsyncFeeEngine::new(
            Arc::new(AsyncFeeLedger::new()),
            LedgerConfig::default(),
            notifier,
        )
    }

    fn draft(id: FeeRecordId, student: &str) -> FeeRecordDraft {
        FeeRecordDraft {
            id: Some(id),
            student: student.to_string(),
            academic_year: "2024-25".to_string(),
            semester: 1,
            due_date: None,
            fees: FeeSchedule {
                tuition: Decimal::new(500, 0),
                hostel: Decimal::new(500, 0),
                ..FeeSchedule::default()
            },
        }
    }

    fn pay(record: FeeRecordId, amount: i64) -> PaymentRequest {
        PaymentRequest {
            record,
            amount: Decimal::new(amount, 0),
            payment_method: PaymentMethod::BankTransfer,
            paid_at: now(),
            transaction_id: None,
            bank_details: None,
            remarks: Some("hostel".to_string()),
        }
    }

    #[test]
    fn test_clones_share_ledger_and_identifiers() {
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(notifier.clone());
        let clone = engine.clone();
        engine.open_record(draft(1, "S1"), now()).unwrap();

        let first = clone.record_payment(&pay(1, 100)).unwrap();
        let second = engine.record_payment(&pay(1, 100)).unwrap();

        assert_ne!(first.payment.payment_id, second.payment.payment_id);
        assert_eq!(engine.get(1).unwrap().payments.len(), 2);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_full_payment_settles_record() {
        let engine = engine(Arc::new(RecordingNotifier::default()));
        engine.open_record(draft(1, "S1"), now()).unwrap();

        let receipt = engine.record_payment(&pay(1, 1000)).unwrap();

        assert_eq!(receipt.total_due, Decimal::ZERO);
        assert_eq!(receipt.overall_status, OverallStatus::Paid);
    }

    #[test]
    fn test_rejects_unknown_record_and_zero_amount() {
        let engine = engine(Arc::new(RecordingNotifier::default()));
        engine.open_record(draft(1, "S1"), now()).unwrap();

        assert_eq!(
            engine.record_payment(&pay(9, 10)),
            Err(ErpError::FeeRecordNotFound { record: 9 })
        );
        assert!(matches!(
            engine.record_payment(&pay(1, 0)),
            Err(ErpError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_trait_process_dispatches_commands() {
        let mut engine = engine(Arc::new(RecordingNotifier::default()));

        engine
            .process(FeeCommand::Open(draft(3, "S3")), now())
            .unwrap();
        engine.process(FeeCommand::Pay(pay(3, 250)), now()).unwrap();

        let records = engine.get_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_paid, Decimal::new(250, 0));
    }
}
