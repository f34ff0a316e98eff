//! Fee ledger types
//!
//! A fee record is the ledger of one student for one academic year and
//! semester. It holds six fixed fee buckets plus an ordered list of named
//! "other" buckets, the derived totals, and the append-only payment history.

use super::error::ErpError;
use super::payment::Payment;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee record identifier
pub type FeeRecordId = u32;

/// Student identifier (roll number or external id)
pub type StudentId = String;

/// Payment state of a single fee bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketStatus {
    Paid,
    Partial,
    Pending,
}

/// Ledger-wide payment state, derived from the buckets and the due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallStatus {
    Paid,
    Partial,
    Pending,
    Overdue,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OverallStatus::Paid => "Paid",
            OverallStatus::Partial => "Partial",
            OverallStatus::Pending => "Pending",
            OverallStatus::Overdue => "Overdue",
        };
        f.write_str(label)
    }
}

/// One named charge within a fee record
///
/// `due` is always `amount - paid` and never negative: the allocator clamps
/// every application to the bucket's outstanding due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBucket {
    pub amount: Decimal,
    pub paid: Decimal,
    pub due: Decimal,
    pub status: BucketStatus,
}

impl FeeBucket {
    /// Create an unpaid bucket for the given amount
    pub fn new(amount: Decimal) -> Self {
        FeeBucket {
            amount,
            paid: Decimal::ZERO,
            due: amount,
            status: BucketStatus::Pending,
        }
    }
}

impl Default for FeeBucket {
    fn default() -> Self {
        FeeBucket::new(Decimal::ZERO)
    }
}

/// The fixed fee heads every record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeHead {
    Tuition,
    Semester,
    Examination,
    Library,
    Laboratory,
    Hostel,
}

impl FeeHead {
    pub const ALL: [FeeHead; 6] = [
        FeeHead::Tuition,
        FeeHead::Semester,
        FeeHead::Examination,
        FeeHead::Library,
        FeeHead::Laboratory,
        FeeHead::Hostel,
    ];
}

impl fmt::Display for FeeHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeeHead::Tuition => "tuitionFee",
            FeeHead::Semester => "semesterFee",
            FeeHead::Examination => "examinationFee",
            FeeHead::Library => "libraryFee",
            FeeHead::Laboratory => "laboratoryFee",
            FeeHead::Hostel => "hostelFee",
        };
        f.write_str(label)
    }
}

/// A named bucket from the variable `otherFees` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherFee {
    pub name: String,
    #[serde(flatten)]
    pub bucket: FeeBucket,
}

/// All buckets of a fee record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBuckets {
    pub tuition_fee: FeeBucket,
    pub semester_fee: FeeBucket,
    pub examination_fee: FeeBucket,
    pub library_fee: FeeBucket,
    pub laboratory_fee: FeeBucket,
    pub hostel_fee: FeeBucket,
    pub other_fees: Vec<OtherFee>,
}

impl FeeBuckets {
    /// Build unpaid buckets from a fee schedule
    pub fn from_schedule(schedule: &FeeSchedule) -> Self {
        FeeBuckets {
            tuition_fee: FeeBucket::new(schedule.tuition),
            semester_fee: FeeBucket::new(schedule.semester),
            examination_fee: FeeBucket::new(schedule.examination),
            library_fee: FeeBucket::new(schedule.library),
            laboratory_fee: FeeBucket::new(schedule.laboratory),
            hostel_fee: FeeBucket::new(schedule.hostel),
            other_fees: schedule
                .other
                .iter()
                .map(|item| OtherFee {
                    name: item.name.clone(),
                    bucket: FeeBucket::new(item.amount),
                })
                .collect(),
        }
    }

    pub fn fixed(&self, head: FeeHead) -> &FeeBucket {
        match head {
            FeeHead::Tuition => &self.tuition_fee,
            FeeHead::Semester => &self.semester_fee,
            FeeHead::Examination => &self.examination_fee,
            FeeHead::Library => &self.library_fee,
            FeeHead::Laboratory => &self.laboratory_fee,
            FeeHead::Hostel => &self.hostel_fee,
        }
    }

    pub fn fixed_mut(&mut self, head: FeeHead) -> &mut FeeBucket {
        match head {
            FeeHead::Tuition => &mut self.tuition_fee,
            FeeHead::Semester => &mut self.semester_fee,
            FeeHead::Examination => &mut self.examination_fee,
            FeeHead::Library => &mut self.library_fee,
            FeeHead::Laboratory => &mut self.laboratory_fee,
            FeeHead::Hostel => &mut self.hostel_fee,
        }
    }

    /// Every bucket, fixed heads first, then `other_fees` in order
    pub fn iter(&self) -> impl Iterator<Item = &FeeBucket> {
        FeeHead::ALL
            .iter()
            .map(move |head| self.fixed(*head))
            .chain(self.other_fees.iter().map(|other| &other.bucket))
    }
}

/// A named line of the fee schedule outside the fixed heads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherFeeItem {
    pub name: String,
    pub amount: Decimal,
}

/// Amounts charged per bucket when a fee record is opened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeSchedule {
    pub tuition: Decimal,
    pub semester: Decimal,
    pub examination: Decimal,
    pub library: Decimal,
    pub laboratory: Decimal,
    pub hostel: Decimal,
    pub other: Vec<OtherFeeItem>,
}

impl FeeSchedule {
    /// Every amount in the schedule, labelled for validation messages
    pub fn amounts(&self) -> impl Iterator<Item = (String, Decimal)> + '_ {
        FeeHead::ALL
            .iter()
            .map(move |head| {
                let amount = match head {
                    FeeHead::Tuition => self.tuition,
                    FeeHead::Semester => self.semester,
                    FeeHead::Examination => self.examination,
                    FeeHead::Library => self.library,
                    FeeHead::Laboratory => self.laboratory,
                    FeeHead::Hostel => self.hostel,
                };
                (head.to_string(), amount)
            })
            .chain(
                self.other
                    .iter()
                    .map(|item| (item.name.clone(), item.amount)),
            )
    }
}

/// Uniqueness key of a fee record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeKey {
    pub student: StudentId,
    pub academic_year: String,
    pub semester: u8,
}

/// Input for opening a fee record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecordDraft {
    /// Explicit record id; assigned by the ledger when absent
    #[serde(default)]
    pub id: Option<FeeRecordId>,
    #[serde(alias = "studentId")]
    pub student: StudentId,
    pub academic_year: String,
    pub semester: u8,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fees: FeeSchedule,
}

impl FeeRecordDraft {
    pub fn key(&self) -> FeeKey {
        FeeKey {
            student: self.student.clone(),
            academic_year: self.academic_year.clone(),
            semester: self.semester,
        }
    }
}

/// Fee ledger of one student for one academic year and semester
///
/// The totals and `overall_status` are derived fields. They are only ever
/// written by the status deriver, which every mutating path calls before the
/// record becomes visible again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub id: FeeRecordId,
    pub student: StudentId,
    pub academic_year: String,
    pub semester: u8,
    pub fees: FeeBuckets,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub total_due: Decimal,
    pub payments: Vec<Payment>,
    pub overall_status: OverallStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FeeRecord {
    /// Create an underived record from a draft
    ///
    /// Callers must run the status deriver before exposing the record.
    pub fn from_draft(id: FeeRecordId, draft: FeeRecordDraft, now: DateTime<Utc>) -> Self {
        let fees = FeeBuckets::from_schedule(&draft.fees);
        FeeRecord {
            id,
            student: draft.student,
            academic_year: draft.academic_year,
            semester: draft.semester,
            fees,
            total_amount: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_due: Decimal::ZERO,
            payments: Vec::new(),
            overall_status: OverallStatus::Pending,
            due_date: draft.due_date,
            created_at: now,
        }
    }

    pub fn key(&self) -> FeeKey {
        FeeKey {
            student: self.student.clone(),
            academic_year: self.academic_year.clone(),
            semester: self.semester,
        }
    }

    /// Sum of amounts that were paid but could not be placed in any bucket
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the sum cannot be represented.
    pub fn unallocated(&self) -> Result<Decimal, ErpError> {
        self.payments
            .iter()
            .try_fold(Decimal::ZERO, |sum, payment| sum.checked_add(payment.unallocated))
            .ok_or_else(|| ErpError::arithmetic_overflow("unallocated", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bucket_is_pending_with_full_due() {
        let bucket = FeeBucket::new(Decimal::new(15000, 0));
        assert_eq!(bucket.paid, Decimal::ZERO);
        assert_eq!(bucket.due, Decimal::new(15000, 0));
        assert_eq!(bucket.status, BucketStatus::Pending);
    }

    #[test]
    fn test_iter_visits_fixed_heads_then_other_fees() {
        let schedule = FeeSchedule {
            tuition: Decimal::new(1, 0),
            semester: Decimal::new(2, 0),
            examination: Decimal::new(3, 0),
            library: Decimal::new(4, 0),
            laboratory: Decimal::new(5, 0),
            hostel: Decimal::new(6, 0),
            other: vec![OtherFeeItem {
                name: "Sports".to_string(),
                amount: Decimal::new(7, 0),
            }],
        };
        let buckets = FeeBuckets::from_schedule(&schedule);

        let amounts: Vec<Decimal> = buckets.iter().map(|bucket| bucket.amount).collect();
        let expected: Vec<Decimal> = (1..=7).map(|n| Decimal::new(n, 0)).collect();
        assert_eq!(amounts, expected);
    }

    #[test]
    fn test_schedule_amounts_are_labelled() {
        let schedule = FeeSchedule {
            tuition: Decimal::new(100, 0),
            ..FeeSchedule::default()
        };
        let labels: Vec<String> = schedule.amounts().map(|(label, _)| label).collect();
        assert_eq!(labels[0], "tuitionFee");
        assert_eq!(labels.len(), 6);
    }
}
