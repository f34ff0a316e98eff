//! Grading engine
//!
//! Turns raw marks into a graded result. Grading is a pure function of the
//! submitted marks, credits, attendance and the zero-total policy; the results
//! book calls it on every save.

use crate::config::ZeroTotalPolicy;
use crate::types::{Attendance, ErpError, ExamResult, Grade, Marks, ResultEntry, ResultStatus};
use rust_decimal::{Decimal, RoundingStrategy};

/// Percentage breakpoints, highest first
const BREAKPOINTS: [(i64, Grade); 7] = [
    (90, Grade::APlus),
    (80, Grade::A),
    (70, Grade::BPlus),
    (60, Grade::B),
    (50, Grade::CPlus),
    (40, Grade::C),
    (35, Grade::D),
];

/// Letter grade for a percentage
pub fn grade_for_percentage(percentage: Decimal) -> Grade {
    BREAKPOINTS
        .iter()
        .find(|(min, _)| percentage >= Decimal::from(*min))
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

/// Grade points on the ten-point scale
pub fn grade_points(grade: Grade) -> Decimal {
    let points = match grade {
        Grade::APlus => 10,
        Grade::A => 9,
        Grade::BPlus => 8,
        Grade::B => 7,
        Grade::CPlus => 6,
        Grade::C => 5,
        Grade::D => 4,
        Grade::F | Grade::I | Grade::W => 0,
    };
    Decimal::from(points)
}

/// Result status implied by a grade
pub fn status_for_grade(grade: Grade) -> ResultStatus {
    match grade {
        Grade::F => ResultStatus::Fail,
        Grade::I | Grade::W => ResultStatus::Incomplete,
        _ => ResultStatus::Pass,
    }
}

/// Round half away from zero to two decimal places
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn too_large(field: &str) -> ErpError {
    ErpError::validation(field, "value is too large to grade")
}

fn validate_marks(field: &str, marks: &Marks) -> Result<(), ErpError> {
    if marks.obtained < Decimal::ZERO || marks.total < Decimal::ZERO {
        return Err(ErpError::validation(field, "marks must not be negative"));
    }
    if marks.obtained > marks.total {
        return Err(ErpError::validation(
            field,
            format!(
                "obtained marks {} exceed the maximum of {}",
                marks.obtained, marks.total
            ),
        ));
    }
    Ok(())
}

/// Grade a submitted result
///
/// Missing mark components count as 0 out of 0. The grade comes from the
/// unrounded percentage; the stored percentage is rounded to 2 dp.
///
/// - Attendance `Absent` grades F with status `Absent`
/// - Attendance `Withdrawn` grades W
/// - A zero maximum is graded by `policy` without dividing
///
/// # Errors
///
/// Returns a validation error if the student, exam or subject is blank, a
/// component has negative marks or more obtained than total marks, the
/// credits are negative, or the marks or credits are too large to total.
pub fn grade_result(entry: &ResultEntry, policy: ZeroTotalPolicy) -> Result<ExamResult, ErpError> {
    for (field, value) in [
        ("student", &entry.student),
        ("exam", &entry.exam),
        ("subject", &entry.subject),
    ] {
        if value.trim().is_empty() {
            return Err(ErpError::validation(field, format!("{} is required", field)));
        }
    }

    let theory = entry.theory_marks.unwrap_or_default();
    let practical = entry.practical_marks.unwrap_or_default();
    let internal = entry.internal_marks.unwrap_or_default();
    validate_marks("theoryMarks", &theory)?;
    validate_marks("practicalMarks", &practical)?;
    validate_marks("internalMarks", &internal)?;

    let credits = entry.credits.unwrap_or(Decimal::ZERO);
    if credits < Decimal::ZERO {
        return Err(ErpError::validation("credits", "credits must not be negative"));
    }

    let obtained = theory
        .obtained
        .checked_add(practical.obtained)
        .and_then(|sum| sum.checked_add(internal.obtained))
        .ok_or_else(|| too_large("marks"))?;
    let maximum = theory
        .total
        .checked_add(practical.total)
        .and_then(|sum| sum.checked_add(internal.total))
        .ok_or_else(|| too_large("marks"))?;
    let total = Marks::new(obtained, maximum);

    let percentage = if total.total.is_zero() {
        None
    } else {
        Some(total.obtained / total.total * Decimal::ONE_HUNDRED)
    };

    let (grade, status) = match (entry.attendance, percentage) {
        (Attendance::Absent, _) => (Grade::F, ResultStatus::Absent),
        (Attendance::Withdrawn, _) => (Grade::W, status_for_grade(Grade::W)),
        (Attendance::Present, Some(pct)) => {
            let grade = grade_for_percentage(pct);
            (grade, status_for_grade(grade))
        }
        (Attendance::Present, None) => match policy {
            ZeroTotalPolicy::Fail => (Grade::F, ResultStatus::Fail),
            ZeroTotalPolicy::Incomplete => (Grade::I, ResultStatus::Incomplete),
        },
    };

    let points = grade_points(grade);
    let credit_points = points
        .checked_mul(credits)
        .ok_or_else(|| too_large("credits"))?;

    Ok(ExamResult {
        student: entry.student.clone(),
        exam: entry.exam.clone(),
        subject: entry.subject.clone(),
        theory_marks: theory,
        practical_marks: practical,
        internal_marks: internal,
        total_marks: total,
        percentage: percentage.map(round2),
        grade,
        grade_points: points,
        credits,
        credit_points,
        status,
    })
}
