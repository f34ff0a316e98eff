//! Ledger configuration
//!
//! Policies the business rules read at run time. Every value has a default
//! matching the college's published rules; the CLI overrides individual
//! values.

use crate::types::FeeHead;
use chrono::Duration;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order in which a payment is spread across the fixed fee heads
///
/// `other_fees` are always visited after the fixed heads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AllocationOrder {
    /// Tuition, semester, examination, then other fees. Library, laboratory
    /// and hostel fees are never paid down by a payment.
    Legacy,
    /// Every fixed head in ledger order, then other fees
    #[default]
    Full,
}

impl AllocationOrder {
    pub fn heads(self) -> &'static [FeeHead] {
        const LEGACY: [FeeHead; 3] = [FeeHead::Tuition, FeeHead::Semester, FeeHead::Examination];
        match self {
            AllocationOrder::Legacy => &LEGACY,
            AllocationOrder::Full => &FeeHead::ALL,
        }
    }
}

/// Grading of a result whose maximum marks add up to zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ZeroTotalPolicy {
    /// Grade F with zero points and status Fail
    #[default]
    Fail,
    /// Grade I with zero points and status Incomplete
    Incomplete,
}

/// Failed-login lockout rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_duration: Duration::hours(2),
        }
    }
}

/// Loan period, renewal extension and overdue fine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CirculationPolicy {
    /// Fine charged per started day past the due date
    pub fine_per_day: Decimal,
    /// Loan period when an issue request names no due date
    pub loan_days: i64,
    /// Extension granted by the single renewal
    pub renewal_days: i64,
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self {
            fine_per_day: Decimal::new(5, 0),
            loan_days: 14,
            renewal_days: 14,
        }
    }
}

/// All business-rule configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    pub allocation_order: AllocationOrder,
    /// Reject payments larger than the allocatable due instead of recording
    /// the excess as unallocated
    pub reject_overpayment: bool,
    pub circulation: CirculationPolicy,
    pub zero_total: ZeroTotalPolicy,
    pub lockout: LockoutPolicy,
}
