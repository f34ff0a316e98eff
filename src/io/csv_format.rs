//! CSV format handling for ledger input and report output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Row structures for every input file (fee records, payments, results,
//!   books, circulation events)
//! - Conversion from CSV rows to domain types through [`CsvRow`]
//! - Report serialization for the fee ledger, graded results and issues
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{
    Attendance, Book, ErpError, ExamResult, FeeCommand, FeeRecord, FeeRecordDraft, FeeRecordId,
    FeeSchedule, IssueId, IssueRecord, IssueRequest, LibraryEvent, Marks, OtherFeeItem,
    PaymentMethod, PaymentRequest, ResultEntry,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// A CSV row that converts into a domain value
pub trait CsvRow: DeserializeOwned {
    type Output;

    /// Validate the raw row and build the domain value
    fn convert(self) -> Result<Self::Output, ErpError>;
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC)
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ErpError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| {
            ErpError::validation("date", format!("'{}' is not a date or RFC 3339 timestamp", value))
        })
}

fn parse_optional_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>, ErpError> {
    non_empty(value).map(|v| parse_timestamp(&v)).transpose()
}

/// Parse a money amount; blank means zero
fn parse_money(field: &str, value: Option<String>) -> Result<Decimal, ErpError> {
    match non_empty(value) {
        None => Ok(Decimal::ZERO),
        Some(v) => Decimal::from_str(&v)
            .map_err(|_| ErpError::validation(field, format!("invalid amount '{}'", v))),
    }
}

fn parse_decimal(field: &str, value: Option<String>) -> Result<Option<Decimal>, ErpError> {
    non_empty(value)
        .map(|v| {
            Decimal::from_str(&v)
                .map_err(|_| ErpError::validation(field, format!("invalid number '{}'", v)))
        })
        .transpose()
}

/// Parse `Name:amount;Name:amount`
fn parse_other_fees(value: Option<String>) -> Result<Vec<OtherFeeItem>, ErpError> {
    let Some(value) = non_empty(value) else {
        return Ok(Vec::new());
    };

    value
        .split(';')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            let (name, amount) = item.split_once(':').ok_or_else(|| {
                ErpError::validation("other", format!("expected 'name:amount', got '{}'", item))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ErpError::validation("other", "fee name is required"));
            }
            Ok(OtherFeeItem {
                name: name.to_string(),
                amount: parse_money(name, Some(amount.to_string()))?,
            })
        })
        .collect()
}

/// Fee record input row
///
/// Columns: `record, student, academic_year, semester, due_date, tuition,
/// semester_fee, examination, library, laboratory, hostel, other`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeeRecordRow {
    pub record: FeeRecordId,
    pub student: String,
    pub academic_year: String,
    pub semester: u8,
    pub due_date: Option<String>,
    pub tuition: Option<String>,
    pub semester_fee: Option<String>,
    pub examination: Option<String>,
    pub library: Option<String>,
    pub laboratory: Option<String>,
    pub hostel: Option<String>,
    pub other: Option<String>,
}

impl CsvRow for FeeRecordRow {
    type Output = FeeCommand;

    fn convert(self) -> Result<FeeCommand, ErpError> {
        let fees = FeeSchedule {
            tuition: parse_money("tuition", self.tuition)?,
            semester: parse_money("semester_fee", self.semester_fee)?,
            examination: parse_money("examination", self.examination)?,
            library: parse_money("library", self.library)?,
            laboratory: parse_money("laboratory", self.laboratory)?,
            hostel: parse_money("hostel", self.hostel)?,
            other: parse_other_fees(self.other)?,
        };

        Ok(FeeCommand::Open(FeeRecordDraft {
            id: Some(self.record),
            student: self.student,
            academic_year: self.academic_year,
            semester: self.semester,
            due_date: parse_optional_timestamp(self.due_date)?,
            fees,
        }))
    }
}

/// Payment input row
///
/// Columns: `record, amount, method, date, transaction_id, remarks`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PaymentRow {
    pub record: FeeRecordId,
    pub amount: Option<String>,
    pub method: String,
    pub date: String,
    pub transaction_id: Option<String>,
    pub remarks: Option<String>,
}

impl CsvRow for PaymentRow {
    type Output = FeeCommand;

    fn convert(self) -> Result<FeeCommand, ErpError> {
        let raw_amount = non_empty(self.amount)
            .ok_or_else(|| ErpError::invalid_amount("<missing>"))?;
        let amount =
            Decimal::from_str(&raw_amount).map_err(|_| ErpError::invalid_amount(&raw_amount))?;
        let payment_method = PaymentMethod::from_str(&self.method).map_err(|_| {
            ErpError::InvalidPaymentMethod {
                method: self.method.clone(),
            }
        })?;

        Ok(FeeCommand::Pay(PaymentRequest {
            record: self.record,
            amount,
            payment_method,
            paid_at: parse_timestamp(&self.date)?,
            transaction_id: non_empty(self.transaction_id),
            bank_details: None,
            remarks: non_empty(self.remarks),
        }))
    }
}

/// Examination result input row
///
/// Columns: `student, exam, subject, credits, theory_obtained, theory_total,
/// practical_obtained, practical_total, internal_obtained, internal_total,
/// attendance`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ResultRow {
    pub student: String,
    pub exam: String,
    pub subject: String,
    pub credits: Option<String>,
    pub theory_obtained: Option<String>,
    pub theory_total: Option<String>,
    pub practical_obtained: Option<String>,
    pub practical_total: Option<String>,
    pub internal_obtained: Option<String>,
    pub internal_total: Option<String>,
    pub attendance: Option<String>,
}

fn parse_marks(
    component: &str,
    obtained: Option<String>,
    total: Option<String>,
) -> Result<Option<Marks>, ErpError> {
    let obtained = parse_decimal(component, obtained)?;
    let total = parse_decimal(component, total)?;
    match (obtained, total) {
        (None, None) => Ok(None),
        (Some(obtained), Some(total)) => Ok(Some(Marks::new(obtained, total))),
        _ => Err(ErpError::validation(
            component,
            "obtained and total marks must be given together",
        )),
    }
}

fn parse_attendance(value: Option<String>) -> Result<Attendance, ErpError> {
    match non_empty(value).map(|v| v.to_lowercase()).as_deref() {
        None | Some("present") => Ok(Attendance::Present),
        Some("absent") => Ok(Attendance::Absent),
        Some("withdrawn") => Ok(Attendance::Withdrawn),
        Some(other) => Err(ErpError::validation(
            "attendance",
            format!("unknown attendance '{}'", other),
        )),
    }
}

impl CsvRow for ResultRow {
    type Output = ResultEntry;

    fn convert(self) -> Result<ResultEntry, ErpError> {
        Ok(ResultEntry {
            theory_marks: parse_marks("theoryMarks", self.theory_obtained, self.theory_total)?,
            practical_marks: parse_marks(
                "practicalMarks",
                self.practical_obtained,
                self.practical_total,
            )?,
            internal_marks: parse_marks(
                "internalMarks",
                self.internal_obtained,
                self.internal_total,
            )?,
            credits: parse_decimal("credits", self.credits)?,
            attendance: parse_attendance(self.attendance)?,
            student: self.student,
            exam: self.exam,
            subject: self.subject,
        })
    }
}

/// Catalogue input row
///
/// Columns: `book, title, copies`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BookRow {
    pub book: String,
    pub title: String,
    pub copies: u32,
}

impl CsvRow for BookRow {
    type Output = Book;

    fn convert(self) -> Result<Book, ErpError> {
        Ok(Book::new(self.book, self.title, self.copies))
    }
}

/// Circulation event input row
///
/// Columns: `type, issue, book, student, date, due_date`. `type` is one of
/// `issue`, `return`, `renew`, `lost`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LibraryEventRow {
    #[serde(rename = "type")]
    pub event_type: String,
    pub issue: Option<IssueId>,
    pub book: Option<String>,
    pub student: Option<String>,
    pub date: String,
    pub due_date: Option<String>,
}

impl CsvRow for LibraryEventRow {
    type Output = (DateTime<Utc>, LibraryEvent);

    fn convert(self) -> Result<Self::Output, ErpError> {
        let at = parse_timestamp(&self.date)?;
        let issue_id = || {
            self.issue
                .ok_or_else(|| ErpError::validation("issue", "issue id is required"))
        };

        let event = match self.event_type.trim().to_lowercase().as_str() {
            "issue" => LibraryEvent::Issue(IssueRequest {
                id: self.issue,
                book: non_empty(self.book.clone())
                    .ok_or_else(|| ErpError::validation("book", "book id is required"))?,
                student: non_empty(self.student.clone())
                    .ok_or_else(|| ErpError::validation("student", "student id is required"))?,
                due_date: parse_optional_timestamp(self.due_date.clone())?,
            }),
            "return" => LibraryEvent::Return(issue_id()?),
            "renew" => LibraryEvent::Renew(issue_id()?),
            "lost" => LibraryEvent::Lost(issue_id()?),
            other => {
                return Err(ErpError::validation(
                    "type",
                    format!("unknown circulation event '{}'", other),
                ))
            }
        };

        Ok((at, event))
    }
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write the fee ledger report
///
/// Columns: `record, student, academic_year, semester, total_amount,
/// total_paid, total_due, unallocated, overall_status`, sorted by record id,
/// money with two decimal places.
pub fn write_ledger_csv(records: &[FeeRecord], output: &mut dyn Write) -> Result<(), ErpError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "record",
        "student",
        "academic_year",
        "semester",
        "total_amount",
        "total_paid",
        "total_due",
        "unallocated",
        "overall_status",
    ])?;

    let mut sorted: Vec<&FeeRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.id);

    for record in sorted {
        writer.write_record(&[
            record.id.to_string(),
            record.student.clone(),
            record.academic_year.clone(),
            record.semester.to_string(),
            money(record.total_amount),
            money(record.total_paid),
            money(record.total_due),
            money(record.unallocated()?),
            record.overall_status.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write graded results
///
/// Columns: `student, exam, subject, obtained, maximum, percentage, grade,
/// grade_points, credits, credit_points, status`. The percentage is blank
/// when the maximum is zero.
pub fn write_results_csv<'a>(
    results: impl IntoIterator<Item = &'a ExamResult>,
    output: &mut dyn Write,
) -> Result<(), ErpError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "student",
        "exam",
        "subject",
        "obtained",
        "maximum",
        "percentage",
        "grade",
        "grade_points",
        "credits",
        "credit_points",
        "status",
    ])?;

    for result in results {
        writer.write_record(&[
            result.student.clone(),
            result.exam.clone(),
            result.subject.clone(),
            result.total_marks.obtained.normalize().to_string(),
            result.total_marks.total.normalize().to_string(),
            result.percentage.map(money).unwrap_or_default(),
            result.grade.to_string(),
            result.grade_points.normalize().to_string(),
            result.credits.normalize().to_string(),
            result.credit_points.normalize().to_string(),
            result.status.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write issue records
///
/// Columns: `issue, book, student, issue_date, due_date, return_date,
/// status, fine, renewed`
pub fn write_issues_csv<'a>(
    issues: impl IntoIterator<Item = &'a IssueRecord>,
    output: &mut dyn Write,
) -> Result<(), ErpError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "issue",
        "book",
        "student",
        "issue_date",
        "due_date",
        "return_date",
        "status",
        "fine",
        "renewed",
    ])?;

    for issue in issues {
        writer.write_record(&[
            issue.id.to_string(),
            issue.book.clone(),
            issue.student.clone(),
            timestamp(issue.issue_date),
            timestamp(issue.due_date),
            issue.return_date.map(timestamp).unwrap_or_default(),
            issue.status.to_string(),
            money(issue.fine),
            issue.renewed.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
