use super::handlers::{self, Call};
use super::types::{ApiRequest, ApiResponse, AppState, Reply};
use crate::types::ErpError;
use chrono::Utc;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// Route one request and wrap the outcome in an envelope
pub fn handle_request(state: &mut AppState, req: &ApiRequest) -> ApiResponse {
    let call = Call::new(req, req.now.unwrap_or_else(Utc::now));
    let outcome = route(state, &call);

    match &outcome {
        Ok(reply) => debug!(method = %call.method, path = %req.path, code = reply.code, "Handled request"),
        Err(e) => debug!(method = %call.method, path = %req.path, code = e.status_code(), "Request failed: {}", e),
    }
    envelope(req.id.clone(), outcome)
}

fn route(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    if let Some(outcome) = handlers::fees::try_handle(state, call) {
        return outcome;
    }
    if let Some(outcome) = handlers::library::try_handle(state, call) {
        return outcome;
    }
    if let Some(outcome) = handlers::exams::try_handle(state, call) {
        return outcome;
    }
    if let Some(outcome) = handlers::auth::try_handle(state, call) {
        return outcome;
    }

    Err(ErpError::RouteNotFound {
        method: call.method.clone(),
        path: call.req.path.clone(),
    })
}

/// Build the `{status, message, data, code}` envelope
pub fn envelope(id: Option<serde_json::Value>, outcome: Result<Reply, ErpError>) -> ApiResponse {
    match outcome {
        Ok(reply) => ApiResponse {
            id,
            status: "success",
            message: reply.message,
            data: Some(reply.data),
            code: reply.code,
        },
        Err(e) => ApiResponse {
            id,
            status: "error",
            message: e.to_string(),
            data: None,
            code: e.status_code(),
        },
    }
}

/// Answer a JSON-lines request stream, one envelope per non-blank line
///
/// A line that is not a valid request gets a 400 envelope; the stream
/// carries on with the next line.
///
/// # Returns
///
/// The number of responses written.
///
/// # Errors
///
/// Returns an error only if reading the input or writing the output fails.
pub fn serve_lines(
    state: &mut AppState,
    input: impl BufRead,
    output: &mut dyn Write,
) -> Result<usize, ErpError> {
    let mut answered = 0;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ApiRequest>(&line) {
            Ok(req) => handle_request(state, &req),
            Err(e) => {
                warn!(line = index + 1, "Invalid request: {}", e);
                envelope(
                    None,
                    Err(ErpError::ParseError {
                        line: Some(index as u64 + 1),
                        message: e.to_string(),
                    }),
                )
            }
        };

        serde_json::to_writer(&mut *output, &response)?;
        writeln!(output)?;
        answered += 1;
    }

    output.flush()?;
    Ok(answered)
}
