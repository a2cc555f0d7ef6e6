use serde::Serialize;

use crate::error::ErrorCode;

/// Successful generation response body.
#[derive(Debug, Serialize)]
pub struct PlaybookResponse {
    pub playbook: String,
}

impl PlaybookResponse {
    pub fn new(playbook: String) -> Self {
        Self { playbook }
    }
}

/// Error response body: a fixed human-readable message plus a stable code
/// the client can branch on.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
}

impl ErrorBody {
    pub fn new(error: &str, code: ErrorCode) -> Self {
        Self {
            error: error.to_string(),
            code,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store_connected: bool,
}

impl HealthResponse {
    pub fn healthy(store_connected: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store_connected,
        }
    }
}
