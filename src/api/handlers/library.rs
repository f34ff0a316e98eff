use super::{to_data, Call};
use crate::api::types::{AppState, Reply};
use crate::types::{Book, ErpError, IssueId, IssueRequest, Role};
use serde::Deserialize;
use serde_json::json;

const LIBRARY_STAFF: [Role; 2] = [Role::Admin, Role::Librarian];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookBody {
    #[serde(alias = "bookId")]
    id: String,
    title: String,
    #[serde(alias = "copies")]
    total_copies: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueBody {
    #[serde(alias = "issue")]
    issue_id: IssueId,
}

pub fn try_handle(state: &mut AppState, call: &Call) -> Option<Result<Reply, ErpError>> {
    if call.method != "POST" {
        return None;
    }
    match call.segments.as_slice() {
        ["api", "library", "books"] => Some(add_book(state, call)),
        ["api", "library", "issue"] => Some(issue(state, call)),
        ["api", "library", "return"] => Some(return_book(state, call)),
        ["api", "library", "renew"] => Some(renew(state, call)),
        ["api", "library", "lost"] => Some(mark_lost(state, call)),
        _ => None,
    }
}

fn add_book(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &LIBRARY_STAFF, "register books")?;
    let body: BookBody = call.body()?;

    let book = state
        .library
        .add_book(Book::new(body.id, body.title, body.total_copies))?;
    Ok(Reply::created("Book registered", to_data(book)?))
}

fn issue(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &LIBRARY_STAFF, "issue books")?;
    let request: IssueRequest = call.body()?;

    let record = state.library.issue(request, call.now)?;
    Ok(Reply::created("Book issued", to_data(&record)?))
}

fn return_book(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &LIBRARY_STAFF, "return books")?;
    let body: IssueBody = call.body()?;

    let record = state.library.return_book(body.issue_id, call.now)?;
    Ok(Reply::ok(
        "Book returned",
        json!({ "issueRecord": record, "fine": record.fine }),
    ))
}

/// Staff renew any loan; a student renews only their own
fn renew(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    let account = state.directory.authorize(
        call.actor(),
        &[Role::Admin, Role::Librarian, Role::Student],
        "renew books",
    )?;
    let body: IssueBody = call.body()?;

    let loan = state
        .library
        .get_issue(body.issue_id)
        .ok_or_else(|| ErpError::issue_not_found(body.issue_id))?;
    if account.role() == Role::Student && !account.is_student(&loan.student) {
        return Err(ErpError::forbidden(account.role(), "renew another student's loan"));
    }

    let record = state.library.renew(body.issue_id, call.now)?;
    Ok(Reply::ok(
        "Book renewed",
        json!({ "issueRecord": record, "newDueDate": record.due_date }),
    ))
}

fn mark_lost(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    state
        .directory
        .authorize(call.actor(), &LIBRARY_STAFF, "mark books lost")?;
    let body: IssueBody = call.body()?;

    let record = state.library.mark_lost(body.issue_id, call.now)?;
    Ok(Reply::ok("Book marked lost", to_data(&record)?))
}
