//! Library circulation types

use super::fee::StudentId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Book identifier (accession number)
pub type BookId = String;

/// Issue (loan) identifier
pub type IssueId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    Issued,
    Maintenance,
    Lost,
}

/// A catalogued title and its copy counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub total_copies: u32,
    pub available_copies: u32,
    pub status: BookStatus,
}

impl Book {
    /// Create a book with every copy on the shelf
    pub fn new(id: impl Into<BookId>, title: impl Into<String>, copies: u32) -> Self {
        Book {
            id: id.into(),
            title: title.into(),
            total_copies: copies,
            available_copies: copies,
            status: if copies > 0 {
                BookStatus::Available
            } else {
                BookStatus::Issued
            },
        }
    }
}

/// Loan state
///
/// `Overdue` is never set by hand: it is derived from `due_date` whenever
/// the circulation desk refreshes or saves an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueStatus {
    Active,
    Returned,
    Overdue,
    Lost,
}

impl IssueStatus {
    /// Whether the copy is still out with the student
    pub fn is_outstanding(self) -> bool {
        matches!(self, IssueStatus::Active | IssueStatus::Overdue)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueStatus::Active => "Active",
            IssueStatus::Returned => "Returned",
            IssueStatus::Overdue => "Overdue",
            IssueStatus::Lost => "Lost",
        };
        f.write_str(label)
    }
}

/// A single book loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub id: IssueId,
    pub book: BookId,
    pub student: StudentId,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: IssueStatus,

    /// Zero until the book is returned
    pub fine: Decimal,

    /// Set by the one permitted renewal
    pub renewed: bool,
}

/// Request to lend a copy of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Explicit issue id; assigned by the circulation desk when absent
    #[serde(default)]
    pub id: Option<IssueId>,
    #[serde(alias = "bookId")]
    pub book: BookId,
    #[serde(alias = "studentId")]
    pub student: StudentId,
    /// Defaults to the issue date plus the loan period
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// A circulation desk event, timestamped by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryEvent {
    Issue(IssueRequest),
    Return(IssueId),
    Renew(IssueId),
    Lost(IssueId),
}
