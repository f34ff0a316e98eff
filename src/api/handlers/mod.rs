//! Route handlers, one module per area
//!
//! Each `try_handle` returns `None` when the call is not one of its routes so
//! the router can try the next area.

pub mod auth;
pub mod exams;
pub mod fees;
pub mod library;

use crate::api::types::ApiRequest;
use crate::types::ErpError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A request with its method normalised, its path split and its clock fixed
pub struct Call<'a> {
    pub req: &'a ApiRequest,
    pub method: String,
    pub segments: Vec<&'a str>,
    pub now: DateTime<Utc>,
}

impl<'a> Call<'a> {
    pub fn new(req: &'a ApiRequest, now: DateTime<Utc>) -> Self {
        Call {
            req,
            method: req.method.trim().to_ascii_uppercase(),
            segments: req.segments(),
            now,
        }
    }

    pub fn actor(&self) -> Option<&str> {
        self.req.actor.as_deref()
    }

    /// Decode the request body
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming the body when it does not match `T`.
    pub fn body<T: DeserializeOwned>(&self) -> Result<T, ErpError> {
        serde_json::from_value(self.req.body.clone())
            .map_err(|e| ErpError::validation("body", e.to_string()))
    }
}

/// Parse a numeric path segment
pub(crate) fn parse_id(segment: &str, field: &str) -> Result<u32, ErpError> {
    segment
        .parse()
        .map_err(|_| ErpError::validation(field, format!("'{}' is not a valid id", segment)))
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Result<serde_json::Value, ErpError> {
    serde_json::to_value(value).map_err(|e| ErpError::internal(e.to_string()))
}
