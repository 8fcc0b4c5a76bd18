//! Error types for the domain layer.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Error codes exposed on the wire.
///
/// The string forms are part of the public protocol: WebSocket `error`
/// messages and HTTP error bodies carry them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Client protocol errors
    InvalidCommand,
    InvalidPayload,

    // Request errors
    Unauthorized,
    NotFound,
    ValidationFailed,

    // Infrastructure errors
    InternalError,
}

impl ErrorCode {
    /// Returns the wire representation of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCommand => "INVALID_COMMAND",
            ErrorCode::InvalidPayload => "INVALID_PAYLOAD",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationFailed => "VALIDATION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates an `INVALID_PAYLOAD` error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPayload, message)
    }

    /// Creates an `INVALID_COMMAND` error.
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCommand, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::invalid_payload("Invalid JSON payload");
        assert_eq!(format!("{}", err), "[INVALID_PAYLOAD] Invalid JSON payload");
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::invalid_command("Unsupported command type: ping")
            .with_detail("type", "ping");

        assert_eq!(err.code, ErrorCode::InvalidCommand);
        assert_eq!(err.details.get("type"), Some(&"ping".to_string()));
    }

    #[test]
    fn error_code_serializes_as_wire_string() {
        let json = serde_json::to_string(&ErrorCode::InvalidPayload).unwrap();
        assert_eq!(json, r#""INVALID_PAYLOAD""#);
        assert_eq!(format!("{}", ErrorCode::InternalError), "INTERNAL_ERROR");
    }
}
