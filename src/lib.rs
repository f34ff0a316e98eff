//! Campus Ledger Library
//! # Overview
//!
//! Stateful business logic of a college ERP: the fee ledger with payment
//! allocation, grading and GPA, library circulation with overdue fines, and
//! login lockout, together with a JSON API layer and CSV pipelines that drive
//! them. Bulk fee files run through either a sync or an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (fee records, payments, results, issues, users)
//! - [`config`] - Policies the business rules read
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::allocator`] - Spreads a payment across fee buckets
//!   - [`core::status`] - Derives bucket and record statuses
//!   - [`core::engine`] - Fee processing orchestration
//!   - [`core::grading`] - Marks to grade, grade points and status
//!   - [`core::circulation`] - Library issue, return, renewal and fines
//!   - [`core::accounts`] - Registration, login lockout and role checks
//! - [`io`] - CSV readers and report writers
//! - [`strategy`] - Sync and async pipelines for bulk fee files
//! - [`api`] - Request routing and the response envelope
//!
//! # Fee Statuses
//!
//! Every fee bucket and every record carries a derived status:
//!
//! - **Paid**: nothing is due
//! - **Partial**: something has been paid and something is due
//! - **Pending**: nothing has been paid yet
//! - **Overdue**: (records only) a balance is outstanding past the due date

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use config::LedgerConfig;
pub use core::{Directory, FeeEngine, FeeLedger, Library, ResultsBook};
pub use io::write_ledger_csv;
pub use types::{
    ErpError, ExamResult, FeeCommand, FeeRecord, FeeRecordId, IssueRecord, Payment,
    PaymentReceipt, PaymentRequest,
};
