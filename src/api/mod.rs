//! JSON API layer
//!
//! Transport-agnostic request handling: a request names a method and a path,
//! the router hands it to the handler for that route, and the outcome is
//! wrapped in a `{status, message, data, code}` envelope whose `code` is the
//! HTTP status the call maps to.
//!
//! # Components
//!
//! - `types` - Request, response envelope and shared state
//! - `router` - Route dispatch, envelopes and the JSON-lines loop
//! - `handlers` - One module per area (fees, library, examinations, auth)

mod handlers;
mod router;
mod types;

pub use router::{envelope, handle_request, serve_lines};
pub use types::{ApiRequest, ApiResponse, AppState, Reply};
