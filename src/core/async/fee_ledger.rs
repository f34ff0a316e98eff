//! Thread-safe fee ledger for concurrent payment processing
//!
//! This module provides the `AsyncFeeLedger` struct, which owns fee records in
//! concurrent maps so payments for different records can be applied in
//! parallel.
//!
//! # Design
//!
//! The `AsyncFeeLedger` uses `DashMap` (a concurrent HashMap) to provide
//! thread-safe access to fee records without a global lock. Each record is
//! locked individually while a payment is allocated and derived, so no reader
//! can observe a record between allocation and derivation.
//!
//! # Lock order
//!
//! Opening a record holds the uniqueness-key entry and then the record entry.
//! Every other operation touches the record map alone, so the two maps are
//! always locked in the same order.

use crate::config::LedgerConfig;
use crate::core::fee_ledger::{apply_payment, open_record, FeeOverview};
use crate::core::status::derive;
use crate::types::{
    ErpError, FeeKey, FeeRecord, FeeRecordDraft, FeeRecordId, Payment, PaymentIds, PaymentRequest,
};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe fee record store
///
/// Multiple tasks can open records and apply payments concurrently. Two
/// payments to the same record are serialized by the record's entry lock.
#[derive(Debug)]
pub struct AsyncFeeLedger {
    /// Fee records keyed by id
    records: DashMap<FeeRecordId, FeeRecord>,

    /// Student, academic year and semester to record id
    keys: DashMap<FeeKey, FeeRecordId>,

    /// Next id handed to drafts without an explicit one
    next_id: AtomicU32,
}

impl AsyncFeeLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            keys: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Open a fee record
    ///
    /// Claiming the uniqueness key and inserting the record happen under the
    /// key's entry lock, so two concurrent drafts for the same student and
    /// semester cannot both succeed.
    ///
    /// # Errors
    ///
    /// - `DuplicateFeeRecord` if the key is already taken
    /// - `DuplicateRecordId` if the requested id is taken
    /// - validation errors from [`open_record`]
    pub fn open(&self, draft: FeeRecordDraft, now: DateTime<Utc>) -> Result<FeeRecord, ErpError> {
        let key_entry = match self.keys.entry(draft.key()) {
            Entry::Occupied(occupied) => {
                let key = occupied.key();
                return Err(ErpError::DuplicateFeeRecord {
                    student: key.student.clone(),
                    academic_year: key.academic_year.clone(),
                    semester: key.semester,
                });
            }
            Entry::Vacant(vacant) => vacant,
        };

        let id = match draft.id {
            Some(id) => id,
            None => self.next_free_id(),
        };

        let record_entry = match self.records.entry(id) {
            Entry::Occupied(_) => return Err(ErpError::DuplicateRecordId { record: id }),
            Entry::Vacant(vacant) => vacant,
        };

        let record = open_record(id, draft, now)?;
        self.next_id
            .fetch_max(id.saturating_add(1), Ordering::SeqCst);
        record_entry.insert(record.clone());
        key_entry.insert(id);

        Ok(record)
    }

    fn next_free_id(&self) -> FeeRecordId {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            if !self.records.contains_key(&id) {
                return id;
            }
        }
    }

    /// Snapshot of a single record
    pub fn get(&self, id: FeeRecordId) -> Option<FeeRecord> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    /// Apply a payment while holding the record's entry lock
    ///
    /// # Returns
    ///
    /// The payment event and a snapshot of the updated record
    ///
    /// # Errors
    ///
    /// - `FeeRecordNotFound` if no record has the requested id
    /// - any error from [`apply_payment`]
    pub fn record_payment(
        &self,
        request: &PaymentRequest,
        issue_ids: impl FnOnce() -> PaymentIds,
        config: &LedgerConfig,
    ) -> Result<(Payment, FeeRecord), ErpError> {
        let mut entry = self
            .records
            .get_mut(&request.record)
            .ok_or_else(|| ErpError::fee_record_not_found(request.record))?;

        let payment = apply_payment(entry.value_mut(), request, issue_ids, config)?;
        Ok((payment, entry.value().clone()))
    }

    /// Re-derive every record as of `now`
    pub fn refresh(&self, now: DateTime<Utc>) -> Result<(), ErpError> {
        for mut entry in self.records.iter_mut() {
            derive(entry.value_mut(), now)?;
        }
        Ok(())
    }

    /// Snapshot of all records, sorted by id
    ///
    /// Records opened or paid by other tasks after the call are not reflected.
    pub fn get_all_records(&self) -> Vec<FeeRecord> {
        let mut records: Vec<FeeRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Result<FeeOverview, ErpError> {
        let records = self.get_all_records();
        FeeOverview::collect(&records, now)
    }
}

impl Default for AsyncFeeLedger {
    fn default() -> Self {
        Self::new()
    }
}
