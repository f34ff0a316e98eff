//! Status derivation for fee records
//!
//! Recomputes bucket dues, bucket statuses, record totals and the overall
//! status. Every write path (opening a record, recording a payment, refreshing
//! the ledger) calls [`derive`] before the record is stored again, so no caller
//! can observe totals that disagree with the buckets.

use crate::types::{BucketStatus, ErpError, FeeBucket, FeeRecord, OverallStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Status of a single bucket from its paid and due amounts
pub fn bucket_status(bucket: &FeeBucket) -> BucketStatus {
    if bucket.due <= Decimal::ZERO {
        BucketStatus::Paid
    } else if bucket.paid > Decimal::ZERO {
        BucketStatus::Partial
    } else {
        BucketStatus::Pending
    }
}

/// Overall status from the record totals
///
/// An outstanding balance past the due date is `Overdue` whatever the
/// paid/pending split says.
pub fn overall_status(
    total_paid: Decimal,
    total_due: Decimal,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> OverallStatus {
    let status = if total_due.is_zero() {
        OverallStatus::Paid
    } else if total_paid > Decimal::ZERO {
        OverallStatus::Partial
    } else {
        OverallStatus::Pending
    };

    match due_date {
        Some(due) if now > due && total_due > Decimal::ZERO => OverallStatus::Overdue,
        _ => status,
    }
}

fn derive_bucket(bucket: &mut FeeBucket) {
    bucket.due = (bucket.amount - bucket.paid).max(Decimal::ZERO);
    bucket.status = bucket_status(bucket);
}

/// Recompute every derived field of a fee record as of `now`
///
/// # Errors
///
/// Returns `ArithmeticOverflow` if a total cannot be represented; the record
/// is left untouched in that case.
pub fn derive(record: &mut FeeRecord, now: DateTime<Utc>) -> Result<(), ErpError> {
    let mut fees = record.fees.clone();
    derive_bucket(&mut fees.tuition_fee);
    derive_bucket(&mut fees.semester_fee);
    derive_bucket(&mut fees.examination_fee);
    derive_bucket(&mut fees.library_fee);
    derive_bucket(&mut fees.laboratory_fee);
    derive_bucket(&mut fees.hostel_fee);
    for other in fees.other_fees.iter_mut() {
        derive_bucket(&mut other.bucket);
    }

    let mut total_amount = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    for bucket in fees.iter() {
        total_amount = total_amount
            .checked_add(bucket.amount)
            .ok_or_else(|| ErpError::arithmetic_overflow("total_amount", record.id))?;
        total_paid = total_paid
            .checked_add(bucket.paid)
            .ok_or_else(|| ErpError::arithmetic_overflow("total_paid", record.id))?;
    }
    let total_due = total_amount
        .checked_sub(total_paid)
        .ok_or_else(|| ErpError::arithmetic_overflow("total_due", record.id))?;

    record.overall_status = overall_status(total_paid, total_due, record.due_date, now);
    record.fees = fees;
    record.total_amount = total_amount;
    record.total_paid = total_paid;
    record.total_due = total_due;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeeRecordDraft, FeeSchedule, OtherFeeItem};
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn record(due_date: Option<DateTime<Utc>>) -> FeeRecord {
        let draft = FeeRecordDraft {
            id: Some(1),
            student: "S1".to_string(),
            academic_year: "2024-25".to_string(),
            semester: 1,
            due_date,
            fees: FeeSchedule {
                tuition: Decimal::new(15000, 0),
                semester: Decimal::new(4000, 0),
                examination: Decimal::new(1000, 0),
                library: Decimal::new(500, 0),
                laboratory: Decimal::new(1500, 0),
                hostel: Decimal::new(8000, 0),
                other: vec![OtherFeeItem {
                    name: "Sports".to_string(),
                    amount: Decimal::new(250, 0),
                }],
            },
        };
        FeeRecord::from_draft(1, draft, now())
    }

    #[test]
    fn test_totals_cover_fixed_and_other_buckets() {
        let mut record = record(None);
        record.fees.tuition_fee.paid = Decimal::new(5000, 0);
        record.fees.other_fees[0].bucket.paid = Decimal::new(250, 0);

        derive(&mut record, now()).unwrap();

        assert_eq!(record.total_amount, Decimal::new(30250, 0));
        assert_eq!(record.total_paid, Decimal::new(5250, 0));
        assert_eq!(record.total_due, Decimal::new(25000, 0));
        assert_eq!(record.fees.tuition_fee.due, Decimal::new(10000, 0));
        assert_eq!(record.fees.tuition_fee.status, BucketStatus::Partial);
        assert_eq!(record.fees.other_fees[0].bucket.status, BucketStatus::Paid);
        assert_eq!(record.fees.hostel_fee.status, BucketStatus::Pending);
        assert_eq!(record.overall_status, OverallStatus::Partial);
    }

    #[test]
    fn test_overdue_overrides_stored_status() {
        let mut record = record(Some(now() - Duration::days(1)));
        record.overall_status = OverallStatus::Pending;

        derive(&mut record, now()).unwrap();

        assert_eq!(record.overall_status, OverallStatus::Overdue);
    }

    #[test]
    fn test_settled_record_is_never_overdue() {
        let mut record = record(Some(now() - Duration::days(30)));
        for head in crate::types::FeeHead::ALL {
            let bucket = record.fees.fixed_mut(head);
            bucket.paid = bucket.amount;
        }
        record.fees.other_fees[0].bucket.paid = Decimal::new(250, 0);

        derive(&mut record, now()).unwrap();

        assert_eq!(record.total_due, Decimal::ZERO);
        assert_eq!(record.overall_status, OverallStatus::Paid);
    }

    #[rstest]
    #[case::nothing_paid(Decimal::ZERO, Decimal::new(100, 0), None, OverallStatus::Pending)]
    #[case::partly_paid(Decimal::new(40, 0), Decimal::new(60, 0), None, OverallStatus::Partial)]
    #[case::fully_paid(Decimal::new(100, 0), Decimal::ZERO, None, OverallStatus::Paid)]
    #[case::due_in_future(Decimal::ZERO, Decimal::new(100, 0), Some(1), OverallStatus::Pending)]
    #[case::past_due(Decimal::new(40, 0), Decimal::new(60, 0), Some(-1), OverallStatus::Overdue)]
    #[case::exactly_at_due(Decimal::ZERO, Decimal::new(100, 0), Some(0), OverallStatus::Pending)]
    fn test_overall_status_rules(
        #[case] paid: Decimal,
        #[case] due: Decimal,
        #[case] due_offset_days: Option<i64>,
        #[case] expected: OverallStatus,
    ) {
        let due_date = due_offset_days.map(|days| now() + Duration::days(days));
        assert_eq!(overall_status(paid, due, due_date, now()), expected);
    }

    #[test]
    fn test_empty_record_is_paid() {
        let draft = FeeRecordDraft {
            id: None,
            student: "S2".to_string(),
            academic_year: "2024-25".to_string(),
            semester: 2,
            due_date: None,
            fees: FeeSchedule::default(),
        };
        let mut record = FeeRecord::from_draft(2, draft, now());

        derive(&mut record, now()).unwrap();

        assert_eq!(record.total_amount, Decimal::ZERO);
        assert_eq!(record.overall_status, OverallStatus::Paid);
    }
}
