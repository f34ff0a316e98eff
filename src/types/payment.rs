//! Payment types for the fee ledger
//!
//! This module defines the incoming payment request, the payment event that is
//! appended to a fee record, and the receipt returned to the caller.

use super::fee::{FeeHead, FeeRecordId, OverallStatus, StudentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accepted payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Cheque,
    Online,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Online => "Online",
            PaymentMethod::BankTransfer => "Bank Transfer",
        };
        f.write_str(label)
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    /// Parse a method name, ignoring case and the separator in "Bank Transfer"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "cheque" => Ok(PaymentMethod::Cheque),
            "online" => Ok(PaymentMethod::Online),
            "banktransfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(format!("Invalid payment method: '{}'", s.trim())),
        }
    }
}

/// Settlement state of a payment event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
}

/// Bank or cheque details supplied with a payment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankDetails {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub cheque_number: Option<String>,
}

/// The bucket a share of a payment landed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum BucketRef {
    Fixed(FeeHead),
    Other(String),
}

/// Share of a payment applied to one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub bucket: BucketRef,
    pub applied: Decimal,
}

/// Incoming payment against a fee record
///
/// Read from a payments CSV row or an API request body.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// The fee record being paid
    pub record: FeeRecordId,

    /// Amount received; must be strictly positive
    pub amount: Decimal,

    pub payment_method: PaymentMethod,

    /// When the payment was received
    pub paid_at: DateTime<Utc>,

    pub transaction_id: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub remarks: Option<String>,
}

/// Identifiers issued for a payment event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIds {
    pub payment_id: String,
    pub receipt_number: String,
}

/// Payment event appended to a fee record's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub transaction_id: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub receipt_number: String,
    pub status: PaymentStatus,
    pub remarks: Option<String>,
    pub allocations: Vec<Allocation>,

    /// Part of `amount` no bucket could absorb
    pub unallocated: Decimal,
}

/// Outcome of a recorded payment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub record: FeeRecordId,
    pub student: StudentId,
    pub payment: Payment,
    pub total_paid: Decimal,
    pub total_due: Decimal,
    pub overall_status: OverallStatus,
}
