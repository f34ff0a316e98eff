use super::{to_data, Call};
use crate::api::types::{AppState, Reply};
use crate::types::{ErpError, ResultEntry, Role};
use serde_json::json;

pub fn try_handle(state: &mut AppState, call: &Call) -> Option<Result<Reply, ErpError>> {
    match (call.method.as_str(), call.segments.as_slice()) {
        ("POST", ["api", "examinations", "results"]) => Some(save_result(state, call)),
        ("GET", ["api", "examinations", "gpa", student]) => Some(gpa(state, call, student)),
        _ => None,
    }
}

/// Grade and store a result; 201 when new, 200 when it replaced one
fn save_result(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &[Role::Admin, Role::Teacher], "publish results")?;
    let entry: ResultEntry = call.body()?;

    let (result, created) = state.results.upsert(&entry)?;
    let data = to_data(&result)?;
    Ok(if created {
        Reply::created("Result published", data)
    } else {
        Reply::ok("Result updated", data)
    })
}

fn gpa(state: &mut AppState, call: &Call, student: &str) -> Result<Reply, ErpError> {
    let account = state.directory.authorize(
        call.actor(),
        &[Role::Admin, Role::Teacher, Role::Student],
        "view GPA",
    )?;
    if account.role() == Role::Student && !account.is_student(student) {
        return Err(ErpError::forbidden(account.role(), "view another student's GPA"));
    }

    let exam = call.req.query("exam");
    let gpa = state.results.gpa(student, exam)?;
    Ok(Reply::ok(
        "GPA",
        json!({ "student": student, "exam": exam, "gpa": gpa }),
    ))
}
