use super::{to_data, Call};
use crate::api::types::{AppState, Reply};
use crate::types::{ErpError, Role, RoleProfile};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct RegisterBody {
    username: String,
    password: String,
    #[serde(flatten)]
    profile: RoleProfile,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

pub fn try_handle(state: &mut AppState, call: &Call) -> Option<Result<Reply, ErpError>> {
    match (call.method.as_str(), call.segments.as_slice()) {
        ("POST", ["api", "auth", "register"]) => Some(register(state, call)),
        ("POST", ["api", "auth", "login"]) => Some(login(state, call)),
        _ => None,
    }
}

/// Register a user
///
/// The first account may be registered by anyone; after that only an admin
/// registers users.
fn register(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    if !state.directory.is_empty() {
        state
            .directory
            .authorize(call.actor(), &[Role::Admin], "register users")?;
    }
    let body: RegisterBody = call.body()?;

    let account = state
        .directory
        .register(&body.username, &body.password, body.profile)?;
    Ok(Reply::created("User registered", to_data(account)?))
}

fn login(state: &mut AppState, call: &Call) -> Result<Reply, ErpError> {
    let body: LoginBody = call.body()?;

    let account = state.directory.login(&body.username, &body.password, call.now)?;
    Ok(Reply::ok("Login successful", json!({ "user": account })))
}
