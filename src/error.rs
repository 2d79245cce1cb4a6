//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the single tagged error type shared by the pricing
//! engine, the state machine, the services, the persistence boundary and
//! the REST layer. Each variant maps to an HTTP status code and a
//! structured JSON error response, so no caller ever has to guess the
//! shape of an error.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::BookingStatus;
use crate::domain::state_machine::TransitionRejection;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "This booking can no longer be modified",
///     "details": "terminal_state"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`GatewayError`] code ranges).
    pub code: u32,
    /// Human-readable error message, safe to show to end users.
    pub message: String,
    /// Machine-readable reason code, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Reason a request failed input validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// The end date is not strictly after the start date.
    InvalidDateRange,
    /// Requested delivery distance exceeds the vehicle's delivery radius.
    DeliveryOutOfRange,
    /// The vehicle's daily rate is zero or negative.
    NegativeRate,
    /// The renter is the owner of the vehicle.
    SelfBooking,
    /// A discount percentage lies outside `0..=100`.
    InvalidDiscount,
    /// A flat or per-kilometre fee is negative.
    NegativeFee,
    /// The requested delivery distance is negative.
    InvalidDeliveryDistance,
}

impl ValidationCode {
    /// Returns the stable snake_case reason code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidDateRange => "invalid_date_range",
            Self::DeliveryOutOfRange => "delivery_out_of_range",
            Self::NegativeRate => "negative_rate",
            Self::SelfBooking => "self_booking",
            Self::InvalidDiscount => "invalid_discount",
            Self::NegativeFee => "negative_fee",
            Self::InvalidDeliveryDistance => "invalid_delivery_distance",
        }
    }

    /// Returns a message suitable for end users.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidDateRange => "The return date must be after the pickup date",
            Self::DeliveryOutOfRange => "The delivery address is outside the vehicle's delivery area",
            Self::NegativeRate => "This vehicle does not have a valid daily rate",
            Self::SelfBooking => "You cannot book your own vehicle",
            Self::InvalidDiscount => "This vehicle has an invalid discount configuration",
            Self::NegativeFee => "This vehicle has an invalid fee configuration",
            Self::InvalidDeliveryDistance => "The delivery distance must not be negative",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1999 | Validation / Auth | 400 / 401 / 403                |
/// | 2000–2999 | State / Not Found | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server            | 500 Internal Server Error      |
/// | 4000–4999 | Booking rules     | 422 Unprocessable Entity       |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed request (bad JSON field, unknown status, oversize text).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request values violate a booking or pricing rule.
    #[error("validation error: {0}")]
    Validation(ValidationCode),

    /// No authenticated user identity was supplied.
    #[error("authentication required")]
    Unauthenticated,

    /// The actor is not a party to the booking.
    #[error("actor is not a party to this booking")]
    Forbidden,

    /// Vehicle with the given ID was not found.
    #[error("vehicle not found: {0}")]
    VehicleNotFound(uuid::Uuid),

    /// Booking with the given ID was not found.
    #[error("booking not found: {0}")]
    BookingNotFound(uuid::Uuid),

    /// The booking's status changed between read and write.
    #[error("booking {0} was modified concurrently")]
    Conflict(uuid::Uuid),

    /// The state machine rejected the requested status change.
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Status the booking was in.
        from: BookingStatus,
        /// Status that was requested.
        to: BookingStatus,
        /// Why the edge was rejected.
        reason: TransitionRejection,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1000,
            Self::Validation(_) => 1001,
            Self::Unauthenticated => 1101,
            Self::Forbidden => 1102,
            Self::VehicleNotFound(_) => 2001,
            Self::BookingNotFound(_) => 2002,
            Self::Conflict(_) => 2101,
            Self::InvalidTransition { .. } => 4001,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::VehicleNotFound(_) | Self::BookingNotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable reason code, if this variant has one.
    #[must_use]
    pub const fn reason_code(&self) -> Option<&'static str> {
        match self {
            Self::Validation(code) => Some(code.as_str()),
            Self::InvalidTransition { reason, .. } => Some(reason.as_str()),
            Self::Conflict(_) => Some("conflict"),
            _ => None,
        }
    }

    /// Returns the message shown to end users.
    ///
    /// Internal state names and storage details are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Validation(code) => code.user_message().to_string(),
            Self::Unauthenticated => "Please sign in to continue".to_string(),
            Self::Forbidden => "You do not have access to this booking".to_string(),
            Self::VehicleNotFound(_) => "Vehicle not found".to_string(),
            Self::BookingNotFound(_) => "Booking not found".to_string(),
            Self::Conflict(_) => {
                "This booking was just updated by someone else, please try again".to_string()
            }
            Self::InvalidTransition { reason, .. } => reason.user_message().to_string(),
            Self::PersistenceError(_) | Self::Internal(_) => {
                "Something went wrong, please try again later".to_string()
            }
        }
    }
}

impl From<ValidationCode> for GatewayError {
    fn from(code: ValidationCode) -> Self {
        Self::Validation(code)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.user_message(),
                details: self.reason_code().map(str::to_string),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
