use crate::db::errors::DbError;
use crate::db::gateway::{RESERVATION_SLOT_CONSTRAINT, USER_EMAIL_CONSTRAINT};
use crate::engine::hours::OpeningHoursViolation;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

/// Message returned when a table already has a booking at the requested instant.
pub const SLOT_TAKEN_MESSAGE: &str = "Table is already reserved for the selected time slot.";

/// Message returned when creating a user whose email is already registered.
pub const EMAIL_TAKEN_MESSAGE: &str = "A user with this email address already exists";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// The requested slot is already booked
    #[error("Conflict: {message}")]
    Conflict { message: String },
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn slot_taken() -> Self {
        Error::Conflict {
            message: SLOT_TAKEN_MESSAGE.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            // Slot conflicts are reported as a plain client error
            Error::Conflict { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some(USER_EMAIL_CONSTRAINT) => EMAIL_TAKEN_MESSAGE.to_string(),
                    Some(RESERVATION_SLOT_CONSTRAINT) => SLOT_TAKEN_MESSAGE.to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Internal server error".to_string(),
            },
            Error::Conflict { message } => message.clone(),
        }
    }
}

impl From<OpeningHoursViolation> for Error {
    fn from(violation: OpeningHoursViolation) -> Self {
        Error::BadRequest {
            message: violation.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(db_err) => {
                tracing::warn!("Database constraint error: {} ({:?})", self, db_err);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::warn!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let body = ErrorResponse {
            message: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation(constraint: &str) -> Error {
        Error::Database(DbError::UniqueViolation {
            constraint: Some(constraint.to_string()),
            table: None,
            message: "duplicate key".to_string(),
            conflicting_value: None,
        })
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::bad_request("nope").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::not_found("Table", 9).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::slot_taken().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(unique_violation(USER_EMAIL_CONSTRAINT).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::Database(DbError::Other(anyhow::anyhow!("connection reset"))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(Error::not_found("Table", 9).user_message(), "Table with ID 9 not found");
        assert_eq!(Error::slot_taken().user_message(), SLOT_TAKEN_MESSAGE);
        assert_eq!(unique_violation(USER_EMAIL_CONSTRAINT).user_message(), EMAIL_TAKEN_MESSAGE);
        assert_eq!(unique_violation(RESERVATION_SLOT_CONSTRAINT).user_message(), SLOT_TAKEN_MESSAGE);
        assert_eq!(unique_violation("other").user_message(), "Resource already exists");
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = Error::Database(DbError::Other(anyhow::anyhow!(
            "password=hunter2 rejected by upstream"
        )));
        assert_eq!(err.user_message(), "Internal server error");

        let err = Error::Internal {
            operation: "load reservations".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn test_opening_hours_violation_is_bad_request() {
        let err: Error = OpeningHoursViolation::EndsAfterClosing { close_hour: 24 }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "Reservation must end before the restaurant closes at 24:00.");
    }
}
