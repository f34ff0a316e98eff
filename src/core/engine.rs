//! Fee processing engine
//!
//! This module provides the `FeeEngine` that orchestrates fee processing by
//! coordinating the `FeeLedger`, the receipt generator and the notifier.
//!
//! The engine enforces business rules such as:
//! - Payment amounts must be strictly positive
//! - Payments may only target an existing fee record
//! - Every successful payment gets a unique payment id and receipt number
//! - The student is notified of every successful payment (best effort)

use crate::config::LedgerConfig;
use crate::core::fee_ledger::{FeeLedger, FeeOverview};
use crate::core::notify::{deliver, Notification, NotificationKind, Notifier};
use crate::core::receipt::ReceiptGenerator;
use crate::core::status::derive;
use crate::core::traits::FeeLedgerEngine;
use crate::types::{
    ErpError, FeeCommand, FeeRecord, FeeRecordDraft, FeeRecordId, Payment, PaymentReceipt,
    PaymentRequest,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Build the receipt returned to the payer
pub(crate) fn receipt_for(record: &FeeRecord, payment: Payment) -> PaymentReceipt {
    PaymentReceipt {
        record: record.id,
        student: record.student.clone(),
        payment,
        total_paid: record.total_paid,
        total_due: record.total_due,
        overall_status: record.overall_status,
    }
}

/// Notification sent to the student after a successful payment
pub(crate) fn payment_notification(receipt: &PaymentReceipt) -> Notification {
    Notification::new(
        receipt.student.clone(),
        NotificationKind::FeePayment,
        "Fee payment received",
        format!(
            "Payment of {} received via {} (receipt {}). Outstanding balance: {}",
            receipt.payment.amount,
            receipt.payment.payment_method,
            receipt.payment.receipt_number,
            receipt.total_due
        ),
    )
}

/// Fee processing engine
///
/// Orchestrates fee processing by coordinating the ledger, identifier
/// generation and notifications. All mutation goes through `&mut self`.
pub struct FeeEngine {
    ledger: FeeLedger,
    receipts: ReceiptGenerator,
    config: LedgerConfig,
    notifier: Arc<dyn Notifier>,
}

impl FeeEngine {
    /// Create a new FeeEngine
    ///
    /// # Arguments
    ///
    /// * `config` - Allocation order and overpayment policy
    /// * `notifier` - Channel for payment notifications
    pub fn new(config: LedgerConfig, notifier: Arc<dyn Notifier>) -> Self {
        FeeEngine {
            ledger: FeeLedger::new(),
            receipts: ReceiptGenerator::new(),
            config,
            notifier,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open a fee record
    ///
    /// # Errors
    ///
    /// Returns an error if the draft is invalid or duplicates an existing
    /// record (see [`FeeLedger::open`]).
    pub fn open_record(
        &mut self,
        draft: FeeRecordDraft,
        now: DateTime<Utc>,
    ) -> Result<&FeeRecord, ErpError> {
        let id = self.ledger.open(draft, now)?;
        debug!(record = id, "Opened fee record");
        self.ledger
            .get(id)
            .ok_or_else(|| ErpError::fee_record_not_found(id))
    }

    /// Record a payment
    ///
    /// Allocates the amount over the record's buckets, re-derives the record,
    /// and notifies the student.
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentReceipt)` with the payment event and the updated totals
    /// * `Err(ErpError)` if the payment was rejected; the record is unchanged
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is zero or negative
    /// - The fee record does not exist
    /// - Overpayments are rejected and the amount exceeds the allocatable due
    pub fn record_payment(&mut self, request: &PaymentRequest) -> Result<PaymentReceipt, ErpError> {
        if request.amount <= rust_decimal::Decimal::ZERO {
            return Err(ErpError::invalid_amount(request.amount));
        }
        if self.ledger.get(request.record).is_none() {
            return Err(ErpError::fee_record_not_found(request.record));
        }

        let receipts = &self.receipts;
        let issue_ids = || receipts.next(request.paid_at);
        let (payment, record) = self.ledger.record_payment(request, issue_ids, &self.config)?;
        let receipt = receipt_for(record, payment);

        debug!(
            record = receipt.record,
            payment = %receipt.payment.payment_id,
            status = %receipt.overall_status,
            "Recorded payment"
        );
        deliver(self.notifier.as_ref(), payment_notification(&receipt));

        Ok(receipt)
    }

    pub fn get(&self, id: FeeRecordId) -> Option<&FeeRecord> {
        self.ledger.get(id)
    }

    /// Copy of a record with its statuses derived as of `now`
    ///
    /// Stored statuses date from the record's last write; the ledger itself is
    /// not modified.
    ///
    /// # Errors
    ///
    /// - `FeeRecordNotFound` if no record has the requested id
    /// - `ArithmeticOverflow` from [`derive`]
    pub fn snapshot(&self, id: FeeRecordId, now: DateTime<Utc>) -> Result<FeeRecord, ErpError> {
        let mut record = self
            .ledger
            .get(id)
            .cloned()
            .ok_or_else(|| ErpError::fee_record_not_found(id))?;
        derive(&mut record, now)?;
        Ok(record)
    }

    /// All records sorted by id
    pub fn get_all_records(&self) -> Vec<&FeeRecord> {
        self.ledger.get_all_records()
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Result<FeeOverview, ErpError> {
        self.ledger.overview(now)
    }
}

impl FeeLedgerEngine for FeeEngine {
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
        self.ledger.get_all_records().into_iter().cloned().collect()
    }
}
