//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction and input checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be positive, got {actual}")]
    NotPositive { field: String, actual: f64 },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a not-positive validation error.
    pub fn not_positive(field: impl Into<String>, actual: f64) -> Self {
        ValidationError::NotPositive {
            field: field.into(),
            actual,
        }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    BidRejected,

    // State errors
    RoomClosed,
    SubmissionInFlight,
    ConfirmationDeclined,

    // Authorization errors
    Forbidden,

    // Infrastructure errors
    NetworkError,
    ProtocolError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::BidRejected => "BID_REJECTED",
            ErrorCode::RoomClosed => "ROOM_CLOSED",
            ErrorCode::SubmissionInFlight => "SUBMISSION_IN_FLIGHT",
            ErrorCode::ConfirmationDeclined => "CONFIRMATION_DECLINED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::ProtocolError => "PROTOCOL_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("content");
        assert_eq!(format!("{}", err), "Field 'content' cannot be empty");
    }

    #[test]
    fn validation_error_not_positive_displays_correctly() {
        let err = ValidationError::not_positive("price", -5.0);
        assert_eq!(format!("{}", err), "Field 'price' must be positive, got -5");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("expires_in_hours", 1, 168, 200);
        assert_eq!(
            format!("{}", err),
            "Field 'expires_in_hours' must be between 1 and 168, got 200"
        );
    }

    #[test]
    fn error_code_displays_screaming_snake() {
        assert_eq!(ErrorCode::SubmissionInFlight.to_string(), "SUBMISSION_IN_FLIGHT");
        assert_eq!(ErrorCode::RoomClosed.to_string(), "ROOM_CLOSED");
    }

    #[test]
    fn validation_error_exposes_field() {
        let err = ValidationError::invalid_format("location_pincode", "must be 6 digits");
        assert_eq!(err.field(), "location_pincode");
    }
}
