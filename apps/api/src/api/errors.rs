use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::errors::RosterError;

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<&'static str>,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    /// Attaches a machine-readable code to the error body
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Creates a 502 Bad Gateway error
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            code: self.code.map(str::to_string),
        });

        (self.status, body).into_response()
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        let code = err.code();
        let api_error = match &err {
            RosterError::CapacityExceeded
            | RosterError::DuplicateEntry { .. }
            | RosterError::InvalidEntry(_) => ApiError::bad_request(err.to_string()),
            RosterError::NotFound(_) => ApiError::not_found(err.to_string()),
            RosterError::UpstreamUnavailable(_) | RosterError::Unreachable(_) => {
                ApiError::bad_gateway(err.user_message())
            }
            RosterError::PersistenceFailure(_) => {
                ApiError::internal_server_error(err.user_message())
            }
        };

        api_error.with_code(code)
    }
}

/// A body that does not parse as the expected JSON is an invalid entry
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        RosterError::InvalidEntry(rejection.body_text()).into()
    }
}
