//! API request/response models for users.

use super::{request_timestamp, validate_timestamp};
use crate::db::models::users::UserDBResponse;
use crate::engine::{InitialReservation, NewUser};
use crate::errors::{Error, Result};
use crate::types::{TableId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Create a user, optionally booking a first reservation.
///
/// `reservationTime` and `reservationTable` must be given together.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[schema(example = "2024-01-01T20:00:00Z")]
    #[validate(custom(function = "validate_timestamp"))]
    pub reservation_time: Option<String>,
    #[validate(range(min = 1, message = "Table ID must be at least 1"))]
    pub reservation_table: Option<TableId>,
}

impl CreateUserRequest {
    pub fn into_new_user(self) -> Result<NewUser> {
        let reservation = match (self.reservation_time.as_deref(), self.reservation_table) {
            (Some(time), Some(table_id)) => Some(InitialReservation {
                table_id,
                date_time: request_timestamp(time)?,
            }),
            (None, None) => None,
            _ => {
                return Err(Error::bad_request(
                    "reservationTime and reservationTable must be provided together",
                ));
            }
        };

        Ok(NewUser {
            name: self.name,
            email: self.email,
            reservation,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
