//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `fee`: Fee records, buckets and schedules
//! - `command`: Commands applied to the fee ledger
//! - `payment`: Payment requests, events and receipts
//! - `library`: Books and issue records
//! - `exam`: Marks, grades and results
//! - `user`: Accounts, role profiles and login state
//! - `error`: Error types for the campus ledger

pub mod command;
pub mod error;
pub mod exam;
pub mod fee;
pub mod library;
pub mod payment;
pub mod user;

pub use command::FeeCommand;
pub use error::ErpError;
pub use exam::{Attendance, ExamResult, Grade, Marks, ResultEntry, ResultKey, ResultStatus};
pub use fee::{
    BucketStatus, FeeBucket, FeeBuckets, FeeHead, FeeKey, FeeRecord, FeeRecordDraft, FeeRecordId,
    FeeSchedule, OtherFee, OtherFeeItem, OverallStatus, StudentId,
};
pub use library::{
    Book, BookId, BookStatus, IssueId, IssueRecord, IssueRequest, IssueStatus, LibraryEvent,
};
pub use payment::{
    Allocation, BankDetails, BucketRef, Payment, PaymentIds, PaymentMethod, PaymentReceipt,
    PaymentRequest, PaymentStatus,
};
pub use user::{LoginState, Role, RoleProfile, UserAccount};
