//! API request/response models for reservations.

use super::pagination::{Pagination, PaginationMeta};
use super::{request_timestamp, validate_timestamp};
use crate::api::models::{tables::TableResponse, users::UserResponse};
use crate::db::models::reservations::ReservationDetailsDBResponse;
use crate::engine::{NewReservation, ReservationPage, ReservationPatch, ReservationQuery};
use crate::errors::Result;
use crate::types::{ReservationId, TableId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub user_email: String,
    #[validate(range(min = 1, message = "Table ID must be at least 1"))]
    pub table_id: TableId,
    /// ISO 8601 start time, interpreted as UTC when no offset is given
    #[schema(example = "2024-01-01T20:00:00Z")]
    #[validate(custom(function = "validate_timestamp"))]
    pub date_time: String,
    /// Minutes (default: 60)
    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration: Option<i32>,
}

impl CreateReservationRequest {
    pub fn into_new_reservation(self) -> Result<NewReservation> {
        Ok(NewReservation {
            date_time: request_timestamp(&self.date_time)?,
            username: self.username,
            user_email: self.user_email,
            table_id: self.table_id,
            duration: self.duration,
        })
    }
}

/// Partial update; omitted fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: Option<String>,
    #[validate(email(message = "Please provide a valid email address"))]
    pub user_email: Option<String>,
    #[validate(range(min = 1, message = "Table ID must be at least 1"))]
    pub table_id: Option<TableId>,
    #[schema(example = "2024-01-01T21:00:00Z")]
    #[validate(custom(function = "validate_timestamp"))]
    pub date_time: Option<String>,
    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration: Option<i32>,
}

impl UpdateReservationRequest {
    pub fn into_patch(self) -> Result<ReservationPatch> {
        Ok(ReservationPatch {
            date_time: self.date_time.as_deref().map(request_timestamp).transpose()?,
            username: self.username,
            user_email: self.user_email,
            table_id: self.table_id,
            duration: self.duration,
        })
    }
}

/// Query parameters for listing reservations
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListReservationsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only reservations starting at or after this ISO 8601 instant
    pub start_date: Option<String>,

    /// Only reservations starting at or before this ISO 8601 instant; a bare date covers the whole day
    pub end_date: Option<String>,
}

impl From<ListReservationsQuery> for ReservationQuery {
    fn from(query: ListReservationsQuery) -> Self {
        Self {
            page: query.pagination.page(),
            limit: query.pagination.limit(),
            start_date: query.start_date,
            end_date: query.end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub user_id: UserId,
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
    /// Minutes
    pub duration: i32,
    /// `dateTime + duration`
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserResponse,
    pub table: TableResponse,
}

impl From<ReservationDetailsDBResponse> for ReservationResponse {
    fn from(details: ReservationDetailsDBResponse) -> Self {
        let end_time = details.reservation.end_time();
        let reservation = details.reservation;
        Self {
            id: reservation.id,
            user_id: reservation.user_id,
            table_id: reservation.table_id,
            date_time: reservation.date_time,
            duration: reservation.duration,
            end_time,
            created_at: reservation.created_at,
            updated_at: reservation.updated_at,
            user: details.user.into(),
            table: details.table.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationsResponse {
    pub reservations: Vec<ReservationResponse>,
    pub meta: PaginationMeta,
}

impl From<ReservationPage> for ReservationsResponse {
    fn from(page: ReservationPage) -> Self {
        let meta = PaginationMeta {
            total_reservations: page.total,
            total_pages: page.total_pages(),
            current_page: page.page,
            page_size: page.limit,
        };
        Self {
            reservations: page.reservations.into_iter().map(Into::into).collect(),
            meta,
        }
    }
}
