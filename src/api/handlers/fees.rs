use super::{parse_id, to_data, Call};
use crate::api::types::{AppState, Reply};
use crate::types::{
    BankDetails, ErpError, FeeRecordDraft, FeeRecordId, PaymentMethod, PaymentRequest, Role,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

const FEE_STAFF: [Role; 2] = [Role::Admin, Role::Accountant];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentBody {
    amount: Decimal,
    payment_method: PaymentMethod,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    bank_details: Option<BankDetails>,
    #[serde(default)]
    remarks: Option<String>,
}

pub fn try_handle(state: &mut AppState, call: &Call) -> Option<Result<Reply, ErpError>> {
    match (call.method.as_str(), call.segments.as_slice()) {
        ("POST", ["api", "fees"]) => Some(create_record(state, call)),
        ("GET", ["api", "fees", "stats", "overview"]) => Some(overview(state, call)),
        ("GET", ["api", "fees", id]) => Some(get_record(state, call, id)),
        ("POST", ["api", "fees", id, "payment"]) => Some(record_payment(state, call, id)),
        _ => None,
    }
}

fn create_record(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &FEE_STAFF, "create fee records")?;
    let draft: FeeRecordDraft = call.body()?;

    let record = state.fees.open_record(draft, call.now)?;
    Ok(Reply::created("Fee record created", to_data(record)?))
}

/// Staff see every record; a student sees only their own
///
/// Statuses are derived as of the request time.
fn get_record(state: &mut AppState, call: &Call, id: &str) -> Result<Reply, ErpError> {
    let account = state.directory.authorize(
        call.actor(),
        &[Role::Admin, Role::Accountant, Role::Student],
        "view fee records",
    )?;
    let id: FeeRecordId = parse_id(id, "id")?;
    let record = state.fees.snapshot(id, call.now)?;

    if account.role() == Role::Student && !account.is_student(&record.student) {
        return Err(ErpError::forbidden(account.role(), "view another student's fees"));
    }
    Ok(Reply::ok("Fee record", to_data(&record)?))
}

fn record_payment(state: &mut AppState, call: &Call, id: &str) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &FEE_STAFF, "record payments")?;
    let record: FeeRecordId = parse_id(id, "id")?;
    let body: PaymentBody = call.body()?;

    let request = PaymentRequest {
        record,
        amount: body.amount,
        payment_method: body.payment_method,
        paid_at: call.now,
        transaction_id: body.transaction_id,
        bank_details: body.bank_details,
        remarks: body.remarks,
    };
    let receipt = state.fees.record_payment(&request)?;
    let fee = state
        .fees
        .get(record)
        .ok_or_else(|| ErpError::fee_record_not_found(record))?;

    Ok(Reply::created(
        format!("Payment recorded, receipt {}", receipt.payment.receipt_number),
        json!({ "fee": fee, "payment": receipt.payment }),
    ))
}

fn overview(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &FEE_STAFF, "view fee statistics")?;

    Ok(Reply::ok("Fee statistics", to_data(&state.fees.overview(call.now)?)?))
}
