//! Ledger commands
//!
//! Every change to the fee ledger enters as a command: opening a fee record
//! or recording a payment against one. Commands are what the readers produce
//! and what both ledger engines consume.

use super::fee::{FeeRecordDraft, FeeRecordId};
use super::payment::PaymentRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum FeeCommand {
    /// Open a fee record for a student, academic year and semester
    Open(FeeRecordDraft),
    /// Record a payment against an open fee record
    Pay(PaymentRequest),
}

impl FeeCommand {
    /// Fee record the command targets, when known up front
    ///
    /// Drafts without an explicit id get one assigned by the ledger.
    pub fn record(&self) -> Option<FeeRecordId> {
        match self {
            FeeCommand::Open(draft) => draft.id,
            FeeCommand::Pay(request) => Some(request.record),
        }
    }
}
