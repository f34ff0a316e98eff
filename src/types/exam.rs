//! Examination result types

use super::fee::StudentId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marks obtained out of a maximum
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Marks {
    pub obtained: Decimal,
    pub total: Decimal,
}

impl Marks {
    pub fn new(obtained: Decimal, total: Decimal) -> Self {
        Marks { obtained, total }
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
    /// Incomplete
    I,
    /// Withdrawn
    W,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::I => "I",
            Grade::W => "W",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Pass,
    Fail,
    Incomplete,
    Withdrawn,
    Absent,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResultStatus::Pass => "Pass",
            ResultStatus::Fail => "Fail",
            ResultStatus::Incomplete => "Incomplete",
            ResultStatus::Withdrawn => "Withdrawn",
            ResultStatus::Absent => "Absent",
        };
        f.write_str(label)
    }
}

/// Whether the student sat the exam
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attendance {
    #[default]
    Present,
    Absent,
    Withdrawn,
}

/// Upsert key of a result: one per student, exam and subject
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultKey {
    pub student: StudentId,
    pub exam: String,
    pub subject: String,
}

/// Raw marks submitted for grading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub student: StudentId,
    pub exam: String,
    pub subject: String,
    #[serde(default)]
    pub theory_marks: Option<Marks>,
    #[serde(default)]
    pub practical_marks: Option<Marks>,
    #[serde(default)]
    pub internal_marks: Option<Marks>,
    #[serde(default)]
    pub credits: Option<Decimal>,
    #[serde(default)]
    pub attendance: Attendance,
}

impl ResultEntry {
    pub fn key(&self) -> ResultKey {
        ResultKey {
            student: self.student.clone(),
            exam: self.exam.clone(),
            subject: self.subject.clone(),
        }
    }
}

/// A graded result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub student: StudentId,
    pub exam: String,
    pub subject: String,
    pub theory_marks: Marks,
    pub practical_marks: Marks,
    pub internal_marks: Marks,
    pub total_marks: Marks,

    /// `None` when the maximum marks are zero
    pub percentage: Option<Decimal>,
    pub grade: Grade,
    pub grade_points: Decimal,
    pub credits: Decimal,
    pub credit_points: Decimal,
    pub status: ResultStatus,
}

impl ExamResult {
    pub fn key(&self) -> ResultKey {
        ResultKey {
            student: self.student.clone(),
            exam: self.exam.clone(),
            subject: self.subject.clone(),
        }
    }
}
