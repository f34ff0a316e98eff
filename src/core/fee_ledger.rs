//! Fee ledger module
//!
//! This module provides the `FeeLedger` struct which owns every fee record and
//! applies payments to them.
//!
//! The FeeLedger is responsible for:
//! - Opening records, one per student, academic year and semester
//! - Applying payments through the allocator and the status deriver
//! - Refreshing derived statuses (overdue) as time passes
//! - Providing sorted record listings and the statistics overview
//!
//! The per-record operations ([`open_record`], [`apply_payment`]) are free
//! functions so the concurrent ledger in `core::async` runs exactly the same
//! rules under its own locking.

use crate::config::LedgerConfig;
use crate::core::allocator::{allocatable_due, allocate};
use crate::core::status::{self, derive};
use crate::types::{
    ErpError, FeeKey, FeeRecord, FeeRecordDraft, FeeRecordId, OverallStatus, Payment, PaymentIds,
    PaymentRequest, PaymentStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Validate a draft and build its derived fee record
///
/// # Errors
///
/// Returns a validation error if the student or academic year is blank, the
/// semester is zero, or any scheduled amount is negative.
pub fn open_record(
    id: FeeRecordId,
    draft: FeeRecordDraft,
    now: DateTime<Utc>,
) -> Result<FeeRecord, ErpError> {
    if draft.student.trim().is_empty() {
        return Err(ErpError::validation("student", "student is required"));
    }
    if draft.academic_year.trim().is_empty() {
        return Err(ErpError::validation(
            "academicYear",
            "academic year is required",
        ));
    }
    if draft.semester == 0 {
        return Err(ErpError::validation(
            "semester",
            "semester must be at least 1",
        ));
    }
    if let Some((label, amount)) = draft
        .fees
        .amounts()
        .find(|(_, amount)| *amount < Decimal::ZERO)
    {
        return Err(ErpError::validation(
            &label,
            format!("amount {} must not be negative", amount),
        ));
    }

    let mut record = FeeRecord::from_draft(id, draft, now);
    derive(&mut record, now)?;
    Ok(record)
}

/// Apply a payment to a single record
///
/// Allocates the amount, appends the payment event and re-derives the record.
/// The work happens on a copy that replaces the record only on success, so a
/// failed payment leaves the record exactly as it was. `issue_ids` is called
/// only once the payment is known to succeed, so rejected payments never use
/// up a payment id or receipt number.
///
/// # Errors
///
/// - `InvalidAmount` if the amount is not strictly positive
/// - `Overpayment` if `config.reject_overpayment` is set and the amount
///   exceeds what the allocation order can absorb
/// - `ArithmeticOverflow` if a total cannot be represented
pub fn apply_payment(
    record: &mut FeeRecord,
    request: &PaymentRequest,
    issue_ids: impl FnOnce() -> PaymentIds,
    config: &LedgerConfig,
) -> Result<Payment, ErpError> {
    if request.amount <= Decimal::ZERO {
        return Err(ErpError::invalid_amount(request.amount));
    }

    let allocatable = allocatable_due(&record.fees, config.allocation_order);
    if config.reject_overpayment && request.amount > allocatable {
        return Err(ErpError::Overpayment {
            record: record.id,
            requested: request.amount,
            allocatable,
        });
    }

    let mut updated = record.clone();
    let outcome = allocate(&mut updated.fees, request.amount, config.allocation_order);
    derive(&mut updated, request.paid_at)?;

    let ids = issue_ids();
    let payment = Payment {
        payment_id: ids.payment_id,
        amount: request.amount,
        payment_method: request.payment_method,
        payment_date: request.paid_at,
        transaction_id: request.transaction_id.clone(),
        bank_details: request.bank_details.clone(),
        receipt_number: ids.receipt_number,
        status: PaymentStatus::Success,
        remarks: request.remarks.clone(),
        allocations: outcome.allocations,
        unallocated: outcome.unallocated,
    };
    updated.payments.push(payment.clone());

    *record = updated;
    Ok(payment)
}

fn add_to(
    total: &mut Decimal,
    amount: Decimal,
    operation: &str,
    record: FeeRecordId,
) -> Result<(), ErpError> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| ErpError::arithmetic_overflow(operation, record))?;
    Ok(())
}

/// Number of records per overall status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub paid: usize,
    pub partial: usize,
    pub pending: usize,
    pub overdue: usize,
}

/// Revenue and status statistics across the ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeOverview {
    pub records: usize,
    pub total_amount: Decimal,
    pub total_collected: Decimal,
    pub total_outstanding: Decimal,
    pub total_unallocated: Decimal,
    pub payments: usize,
    pub by_status: StatusCounts,
}

impl FeeOverview {
    /// Aggregate records, deriving each status as of `now`
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` naming the first record whose amounts push
    /// a total past what a decimal can hold.
    pub fn collect<'a>(
        records: impl IntoIterator<Item = &'a FeeRecord>,
        now: DateTime<Utc>,
    ) -> Result<Self, ErpError> {
        let mut overview = FeeOverview::default();

        for record in records {
            let id = record.id;
            overview.records += 1;
            add_to(&mut overview.total_amount, record.total_amount, "total_amount", id)?;
            add_to(&mut overview.total_collected, record.total_paid, "total_collected", id)?;
            add_to(&mut overview.total_outstanding, record.total_due, "total_outstanding", id)?;
            add_to(&mut overview.total_unallocated, record.unallocated()?, "total_unallocated", id)?;
            overview.payments += record.payments.len();

            match status::overall_status(record.total_paid, record.total_due, record.due_date, now) {
                OverallStatus::Paid => overview.by_status.paid += 1,
                OverallStatus::Partial => overview.by_status.partial += 1,
                OverallStatus::Pending => overview.by_status.pending += 1,
                OverallStatus::Overdue => overview.by_status.overdue += 1,
            }
        }

        Ok(overview)
    }
}

/// Owns all fee records
///
/// Single-threaded: every mutation goes through `&mut self`, so allocation
/// and derivation of one payment can never interleave with another.
pub struct FeeLedger {
    records: HashMap<FeeRecordId, FeeRecord>,
    keys: HashMap<FeeKey, FeeRecordId>,
    next_id: FeeRecordId,
}

impl FeeLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        FeeLedger {
            records: HashMap::new(),
            keys: HashMap::new(),
            next_id: 1,
        }
    }

    /// Open a fee record for a student, academic year and semester
    ///
    /// Uses the draft's id when given, otherwise the next free id.
    ///
    /// # Errors
    ///
    /// - `DuplicateFeeRecord` if the student already has a record for the
    ///   academic year and semester
    /// - `DuplicateRecordId` if the requested id is taken
    /// - validation errors from [`open_record`]
    pub fn open(&mut self, draft: FeeRecordDraft, now: DateTime<Utc>) -> Result<FeeRecordId, ErpError> {
        let key = draft.key();
        if self.keys.contains_key(&key) {
            return Err(ErpError::DuplicateFeeRecord {
                student: key.student,
                academic_year: key.academic_year,
                semester: key.semester,
            });
        }

        let id = match draft.id {
            Some(id) if self.records.contains_key(&id) => {
                return Err(ErpError::DuplicateRecordId { record: id })
            }
            Some(id) => id,
            None => self.next_free_id(),
        };

        let record = open_record(id, draft, now)?;
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.keys.insert(key, id);
        self.records.insert(id, record);

        Ok(id)
    }

    fn next_free_id(&self) -> FeeRecordId {
        let mut id = self.next_id;
        while self.records.contains_key(&id) {
            id = id.saturating_add(1);
        }
        id
    }

    pub fn get(&self, id: FeeRecordId) -> Option<&FeeRecord> {
        self.records.get(&id)
    }

    pub fn find(&self, key: &FeeKey) -> Option<&FeeRecord> {
        self.keys.get(key).and_then(|id| self.records.get(id))
    }

    /// Record a payment against an existing fee record
    ///
    /// # Errors
    ///
    /// - `FeeRecordNotFound` if no record has the requested id
    /// - any error from [`apply_payment`]
    pub fn record_payment(
        &mut self,
        request: &PaymentRequest,
        issue_ids: impl FnOnce() -> PaymentIds,
        config: &LedgerConfig,
    ) -> Result<(Payment, &FeeRecord), ErpError> {
        let record = self
            .records
            .get_mut(&request.record)
            .ok_or_else(|| ErpError::fee_record_not_found(request.record))?;

        let payment = apply_payment(record, request, issue_ids, config)?;
        Ok((payment, &*record))
    }

    /// Re-derive every record as of `now`
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<(), ErpError> {
        for record in self.records.values_mut() {
            derive(record, now)?;
        }
        Ok(())
    }

    /// All records sorted by id
    pub fn get_all_records(&self) -> Vec<&FeeRecord> {
        let mut records: Vec<&FeeRecord> = self.records.values().collect();
        records.sort_by_key(|record| record.id);
        records
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Result<FeeOverview, ErpError> {
        FeeOverview::collect(self.records.values(), now)
    }
}

impl Default for FeeLedger {
    fn default() -> Self {
        Self::new()
    }
}
