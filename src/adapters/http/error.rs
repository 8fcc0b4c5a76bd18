//! HTTP error responses.
//!
//! Errors raised before a WebSocket upgrade are returned as JSON bodies of
//! the form `{"message": ..., "code": ...}`.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::adapters::websocket::HubError;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Request-level API error.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a HashMap<String, String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Unauthorized: missing or invalid token",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, message)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        let status = match error.code {
            ErrorCode::InvalidCommand | ErrorCode::InvalidPayload | ErrorCode::ValidationFailed => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: error.code,
            message: error.message,
            details: error.details,
        }
    }
}

impl From<HubError> for ApiError {
    fn from(error: HubError) -> Self {
        ApiError::internal(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: &self.message,
            code: self.code,
            details: (!self.details.is_empty()).then_some(&self.details),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SyncSourceError;

    #[test]
    fn hub_errors_map_to_internal_error() {
        let error = ApiError::from(HubError::Subscribe(SyncSourceError::NotInitialized));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code, ErrorCode::InternalError);
        assert!(error.message.contains("not initialized"));
    }

    #[test]
    fn domain_errors_keep_code_and_details() {
        let error = ApiError::from(
            DomainError::new(ErrorCode::ValidationFailed, "Invalid input")
                .with_detail("chatID", "required"),
        );
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.details.get("chatID").map(String::as_str), Some("required"));
    }

    #[test]
    fn unauthorized_response_has_401() {
        let response = ApiError::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
