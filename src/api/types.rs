use crate::config::LedgerConfig;
use crate::core::{Directory, FeeEngine, Library, Notifier, ResultsBook};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One API call
///
/// `now` pins the clock for the call so recorded request files replay the
/// same way every time; without it the wall clock is used.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRequest {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    pub path: String,
    /// Username the call is made as
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl ApiRequest {
    /// Path segments without the query string
    pub fn segments(&self) -> Vec<&str> {
        let path = self.path.split('?').next().unwrap_or_default();
        path.split('/').filter(|segment| !segment.is_empty()).collect()
    }

    /// Value of a query string parameter
    pub fn query(&self, name: &str) -> Option<&str> {
        let (_, query) = self.path.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub code: u16,
}

/// Successful handler outcome, before it is wrapped in an envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub code: u16,
    pub message: String,
    pub data: serde_json::Value,
}

impl Reply {
    pub fn ok(message: impl Into<String>, data: serde_json::Value) -> Self {
        Reply {
            code: 200,
            message: message.into(),
            data,
        }
    }

    pub fn created(message: impl Into<String>, data: serde_json::Value) -> Self {
        Reply {
            code: 201,
            message: message.into(),
            data,
        }
    }
}

/// Everything the handlers read and write
pub struct AppState {
    pub fees: FeeEngine,
    pub library: Library,
    pub results: ResultsBook,
    pub directory: Directory,
}

impl AppState {
    pub fn new(config: LedgerConfig, salt: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        AppState {
            fees: FeeEngine::new(config, Arc::clone(&notifier)),
            library: Library::new(config.circulation, Arc::clone(&notifier)),
            results: ResultsBook::new(config.zero_total, notifier),
            directory: Directory::new(salt, config.lockout),
        }
    }
}
