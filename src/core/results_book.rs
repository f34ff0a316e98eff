//! Examination results book
//!
//! Stores one graded result per student, exam and subject. Saving a result
//! always regrades it, so stored grades can never disagree with their marks.

use crate::config::ZeroTotalPolicy;
use crate::core::grading::{grade_result, round2};
use crate::core::notify::{deliver, Notification, NotificationKind, Notifier};
use crate::types::{ErpError, ExamResult, ResultEntry, ResultKey};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct ResultsBook {
    results: BTreeMap<ResultKey, ExamResult>,
    zero_total: ZeroTotalPolicy,
    notifier: Arc<dyn Notifier>,
}

impl ResultsBook {
    pub fn new(zero_total: ZeroTotalPolicy, notifier: Arc<dyn Notifier>) -> Self {
        ResultsBook {
            results: BTreeMap::new(),
            zero_total,
            notifier,
        }
    }

    /// Grade and store a result, replacing any earlier one with the same key
    ///
    /// # Returns
    ///
    /// The graded result and `true` when it was newly created, `false` when it
    /// replaced an existing result
    ///
    /// # Errors
    ///
    /// Returns a validation error from grading; the book is unchanged.
    pub fn upsert(&mut self, entry: &ResultEntry) -> Result<(ExamResult, bool), ErpError> {
        let result = grade_result(entry, self.zero_total)?;
        let created = self
            .results
            .insert(result.key(), result.clone())
            .is_none();

        debug!(
            student = %result.student,
            exam = %result.exam,
            subject = %result.subject,
            grade = %result.grade,
            created,
            "Saved result"
        );
        deliver(
            self.notifier.as_ref(),
            Notification::new(
                result.student.clone(),
                NotificationKind::ResultPublished,
                "Result published",
                format!(
                    "{} ({}): grade {}, status {}",
                    result.subject, result.exam, result.grade, result.status
                ),
            ),
        );

        Ok((result, created))
    }

    pub fn get(&self, key: &ResultKey) -> Option<&ExamResult> {
        self.results.get(key)
    }

    /// All results ordered by student, exam and subject
    pub fn results(&self) -> impl Iterator<Item = &ExamResult> {
        self.results.values()
    }

    /// Grade point average for a student, optionally within one exam
    ///
    /// `sum(credit_points) / sum(credits)` over results carrying credits,
    /// rounded to 2 dp. `None` when no result carries credits.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the student's credits are too large to
    /// total.
    pub fn gpa(&self, student: &str, exam: Option<&str>) -> Result<Option<Decimal>, ErpError> {
        let (points, credits) = self
            .results
            .values()
            .filter(|result| result.student == student)
            .filter(|result| exam.map_or(true, |exam| result.exam == exam))
            .filter(|result| result.credits > Decimal::ZERO)
            .try_fold((Decimal::ZERO, Decimal::ZERO), |(points, credits), result| {
                Some((
                    points.checked_add(result.credit_points)?,
                    credits.checked_add(result.credits)?,
                ))
            })
            .ok_or_else(|| ErpError::validation("credits", "total credits are too large"))?;

        if credits.is_zero() {
            Ok(None)
        } else {
            Ok(Some(round2(points / credits)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::testing::RecordingNotifier;
    use crate::types::{Attendance, Grade, Marks};

    fn entry(student: &str, exam: &str, subject: &str, obtained: i64, credits: i64) -> ResultEntry {
        ResultEntry {
            student: student.to_string(),
            exam: exam.to_string(),
            subject: subject.to_string(),
            theory_marks: Some(Marks::new(Decimal::from(obtained), Decimal::from(100))),
            practical_marks: None,
            internal_marks: None,
            credits: Some(Decimal::from(credits)),
            attendance: Attendance::Present,
        }
    }

    fn book() -> ResultsBook {
        ResultsBook::new(ZeroTotalPolicy::Fail, Arc::new(RecordingNotifier::default()))
    }

    #[test]
    fn test_upsert_creates_then_replaces() {
        let mut book = book();

        let (first, created) = book.upsert(&entry("S1", "END", "Maths", 55, 4)).unwrap();
        let (second, replaced) = book.upsert(&entry("S1", "END", "Maths", 91, 4)).unwrap();

        assert!(created);
        assert!(!replaced);
        assert_eq!(first.grade, Grade::CPlus);
        assert_eq!(second.grade, Grade::APlus);
        assert_eq!(book.results().count(), 1);
        assert_eq!(book.get(&second.key()).map(|r| r.grade), Some(Grade::APlus));
    }

    #[test]
    fn test_invalid_entry_leaves_book_unchanged() {
        let mut book = book();
        book.upsert(&entry("S1", "END", "Maths", 55, 4)).unwrap();

        let result = book.upsert(&entry("S1", "END", "Maths", 120, 4));

        assert!(result.is_err());
        assert_eq!(book.results().next().map(|r| r.grade), Some(Grade::CPlus));
    }

    #[test]
    fn test_gpa_weights_by_credits() {
        let mut book = book();
        book.upsert(&entry("S1", "END", "Maths", 85, 4)).unwrap(); // A, 9 points
        book.upsert(&entry("S1", "END", "Chemistry", 65, 2)).unwrap(); // B, 7 points

        // (36 + 14) / 6
        assert_eq!(book.gpa("S1", None), Ok(Some(Decimal::new(833, 2))));
    }

    #[test]
    fn test_gpa_can_be_limited_to_one_exam() {
        let mut book = book();
        book.upsert(&entry("S1", "MID", "Maths", 95, 4)).unwrap();
        book.upsert(&entry("S1", "END", "Maths", 45, 4)).unwrap();

        assert_eq!(book.gpa("S1", Some("MID")), Ok(Some(Decimal::from(10))));
        assert_eq!(book.gpa("S1", Some("END")), Ok(Some(Decimal::from(5))));
        assert_eq!(book.gpa("S1", None), Ok(Some(Decimal::new(750, 2))));
    }

    #[test]
    fn test_gpa_without_credits_is_none() {
        let mut book = book();
        book.upsert(&entry("S1", "END", "Seminar", 80, 0)).unwrap();

        assert_eq!(book.gpa("S1", None), Ok(None));
        assert_eq!(book.gpa("S2", None), Ok(None));
    }

    #[test]
    fn test_gpa_reports_credit_totals_too_large() {
        let mut book = book();
        for subject in ["Maths", "Physics"] {
            let mut failed = entry("S1", "END", subject, 0, 0);
            failed.credits = Some(Decimal::MAX);
            book.upsert(&failed).unwrap();
        }

        assert!(matches!(
            book.gpa("S1", None),
            Err(ErpError::Validation { .. })
        ));
    }

    #[test]
    fn test_saving_notifies_student() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut book = ResultsBook::new(ZeroTotalPolicy::Fail, notifier.clone());

        book.upsert(&entry("S7", "END", "Maths", 70, 3)).unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0].recipient, "S7");
        assert_eq!(sent[0].kind, NotificationKind::ResultPublished);
    }
}
