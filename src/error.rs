use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::provider::ProviderError;
use crate::response::ErrorBody;

/// Service-level error taxonomy. Each variant maps to exactly one HTTP
/// status and one fixed client-facing message; internal detail stays in
/// the logs.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("missing required fields")]
    MissingFields,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("provider overloaded: {0}")]
    ProviderOverloaded(String),

    #[error("provider failure: {0}")]
    ProviderFatal(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("quota store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Stable machine-readable error codes shared with the client, so the
/// presentation layer can branch on `code` instead of matching message
/// substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingFields,
    MethodNotAllowed,
    RateLimited,
    ProviderOverloaded,
    InternalError,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingFields => StatusCode::BAD_REQUEST,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::ProviderOverloaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::ProviderFatal(_)
            | ProxyError::MalformedResponse(_)
            | ProxyError::StoreUnavailable(_)
            | ProxyError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ProxyError::MissingFields => ErrorCode::MissingFields,
            ProxyError::MethodNotAllowed => ErrorCode::MethodNotAllowed,
            ProxyError::RateLimited => ErrorCode::RateLimited,
            ProxyError::ProviderOverloaded(_) => ErrorCode::ProviderOverloaded,
            ProxyError::ProviderFatal(_)
            | ProxyError::MalformedResponse(_)
            | ProxyError::StoreUnavailable(_)
            | ProxyError::Configuration(_) => ErrorCode::InternalError,
        }
    }

    /// The fixed message the client sees. Never includes provider or store
    /// detail.
    pub fn client_message(&self) -> &'static str {
        match self {
            ProxyError::MissingFields => "Missing required fields",
            ProxyError::MethodNotAllowed => "Method not allowed",
            ProxyError::RateLimited => {
                "Rate limit exceeded. You can generate up to 5 playbooks per month."
            }
            ProxyError::ProviderOverloaded(_) => {
                "Service temporarily unavailable. The free API quota has been reached. \
                 Please try again tomorrow."
            }
            ProxyError::ProviderFatal(_)
            | ProxyError::MalformedResponse(_)
            | ProxyError::StoreUnavailable(_)
            | ProxyError::Configuration(_) => "Internal server error. Please try again.",
        }
    }
}

impl From<ProviderError> for ProxyError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Overloaded(msg) => ProxyError::ProviderOverloaded(msg),
            ProviderError::Fatal(msg) => ProxyError::ProviderFatal(msg),
            ProviderError::Malformed(msg) => ProxyError::MalformedResponse(msg),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "playbook_proxy::error", error = %self, "request failed");
        } else {
            tracing::debug!(target: "playbook_proxy::error", error = %self, "request rejected");
        }

        let body = ErrorBody::new(self.client_message(), self.code());
        (status, Json(body)).into_response()
    }
}
