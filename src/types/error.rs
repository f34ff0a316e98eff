//! Error types for the campus ledger
//!
//! This module defines every error the ledger, circulation desk, results book
//! and account directory can report. Each variant maps onto one HTTP status so
//! the API layer can build its response envelope without inspecting messages.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc. (fatal in the CLI)
//! - **Parse Errors**: Malformed CSV or JSON input (record skipped)
//! - **Validation Errors**: Bad amounts, unknown payment methods, duplicates (400)
//! - **Lookup Errors**: Unknown fee record, book, issue or route (404)
//! - **Access Errors**: Bad credentials (401), role mismatch (403), locked account (423)
//! - **Arithmetic Errors**: Overflow in ledger sums (500)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use super::fee::FeeRecordId;
use super::library::IssueId;

/// Main error type for the campus ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErpError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV or JSON input could not be parsed
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },

    /// A field failed validation
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Payment amount is zero, negative or not numeric
    #[error("Invalid amount '{amount}': amount must be a positive number")]
    InvalidAmount { amount: String },

    /// Payment method is not one of Cash, Cheque, Online, Bank Transfer
    #[error("Invalid payment method '{method}'")]
    InvalidPaymentMethod { method: String },

    /// Payment exceeds what the allocation order can absorb
    #[error("Payment of {requested} on fee record {record} exceeds the allocatable due of {allocatable}")]
    Overpayment {
        record: FeeRecordId,
        requested: Decimal,
        allocatable: Decimal,
    },

    /// A fee record already exists for the student, year and semester
    #[error("Fee record already exists for student {student} ({academic_year}, semester {semester})")]
    DuplicateFeeRecord {
        student: String,
        academic_year: String,
        semester: u8,
    },

    /// A fee record id was reused
    #[error("Fee record id {record} is already in use")]
    DuplicateRecordId { record: FeeRecordId },

    #[error("Fee record {record} not found")]
    FeeRecordNotFound { record: FeeRecordId },

    #[error("Book {book} not found")]
    BookNotFound { book: String },

    #[error("Book {book} is already catalogued")]
    DuplicateBook { book: String },

    #[error("Book {book} has no copies available")]
    BookUnavailable { book: String },

    /// The student already holds a copy of the book
    #[error("Book {book} is already issued to student {student}")]
    DuplicateIssue { book: String, student: String },

    #[error("Issue {issue} not found")]
    IssueNotFound { issue: IssueId },

    #[error("Issue id {issue} is already in use")]
    DuplicateIssueId { issue: IssueId },

    /// The issue's status does not permit the operation
    #[error("Cannot {operation} issue {issue} with status {status}")]
    InvalidIssueState {
        issue: IssueId,
        status: String,
        operation: String,
    },

    /// The one permitted renewal has already been used
    #[error("Issue {issue} has already been renewed")]
    AlreadyRenewed { issue: IssueId },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    /// The caller's role may not perform the action
    #[error("Role {role} is not permitted to {action}")]
    Forbidden { role: String, action: String },

    #[error("Account {username} is locked until {until}")]
    AccountLocked {
        username: String,
        until: DateTime<Utc>,
    },

    #[error("User {username} already exists")]
    DuplicateUser { username: String },

    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Arithmetic overflow in {operation} for fee record {record}")]
    ArithmeticOverflow {
        operation: String,
        record: FeeRecordId,
    },

    /// A notification could not be delivered
    ///
    /// Never surfaced to callers of the primary operation.
    #[error("Notification to {recipient} failed: {message}")]
    NotificationFailed { recipient: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ErpError {
    /// HTTP status code for the API response envelope
    pub fn status_code(&self) -> u16 {
        match self {
            ErpError::ParseError { .. }
            | ErpError::Validation { .. }
            | ErpError::InvalidAmount { .. }
            | ErpError::InvalidPaymentMethod { .. }
            | ErpError::Overpayment { .. }
            | ErpError::DuplicateFeeRecord { .. }
            | ErpError::DuplicateRecordId { .. }
            | ErpError::DuplicateBook { .. }
            | ErpError::BookUnavailable { .. }
            | ErpError::DuplicateIssue { .. }
            | ErpError::DuplicateIssueId { .. }
            | ErpError::InvalidIssueState { .. }
            | ErpError::AlreadyRenewed { .. }
            | ErpError::DuplicateUser { .. } => 400,
            ErpError::InvalidCredentials | ErpError::Unauthenticated => 401,
            ErpError::Forbidden { .. } => 403,
            ErpError::FileNotFound { .. }
            | ErpError::FeeRecordNotFound { .. }
            | ErpError::BookNotFound { .. }
            | ErpError::IssueNotFound { .. }
            | ErpError::RouteNotFound { .. } => 404,
            ErpError::AccountLocked { .. } => 423,
            ErpError::IoError { .. }
            | ErpError::ArithmeticOverflow { .. }
            | ErpError::NotificationFailed { .. }
            | ErpError::Internal { .. } => 500,
        }
    }
}

// Conversion from io::Error to ErpError
impl From<std::io::Error> for ErpError {
    fn from(error: std::io::Error) -> Self {
        ErpError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to ErpError
impl From<csv::Error> for ErpError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        ErpError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ErpError {
    fn from(error: serde_json::Error) -> Self {
        ErpError::ParseError {
            line: Some(error.line() as u64),
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl ErpError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ErpError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_amount(amount: impl ToString) -> Self {
        ErpError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    pub fn fee_record_not_found(record: FeeRecordId) -> Self {
        ErpError::FeeRecordNotFound { record }
    }

    pub fn arithmetic_overflow(operation: &str, record: FeeRecordId) -> Self {
        ErpError::ArithmeticOverflow {
            operation: operation.to_string(),
            record,
        }
    }

    pub fn book_not_found(book: &str) -> Self {
        ErpError::BookNotFound {
            book: book.to_string(),
        }
    }

    pub fn issue_not_found(issue: IssueId) -> Self {
        ErpError::IssueNotFound { issue }
    }

    pub fn invalid_issue_state(issue: IssueId, status: impl ToString, operation: &str) -> Self {
        ErpError::InvalidIssueState {
            issue,
            status: status.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn forbidden(role: impl ToString, action: &str) -> Self {
        ErpError::Forbidden {
            role: role.to_string(),
            action: action.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ErpError::Internal {
            message: message.into(),
        }
    }
}
