//! Database models for reservations.

use crate::db::models::{tables::TableDBResponse, users::UserDBResponse};
use crate::types::{ReservationId, TableId, UserId};
use chrono::{DateTime, Duration, Utc};

/// Database request for creating a new reservation
#[derive(Debug, Clone)]
pub struct ReservationCreateDBRequest {
    pub user_id: UserId,
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
    pub duration: i32,
}

/// Database request for updating a reservation.
///
/// Carries the complete effective values; partial updates are merged before this is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationUpdateDBRequest {
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
    pub duration: i32,
}

/// Database response for a reservation
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDBResponse {
    pub id: ReservationId,
    pub user_id: UserId,
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
    /// Minutes
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationDBResponse {
    /// The instant the booking ends (`date_time + duration`).
    pub fn end_time(&self) -> DateTime<Utc> {
        self.date_time + Duration::minutes(i64::from(self.duration))
    }
}

/// A reservation together with the user who owns it and the table it books.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDetailsDBResponse {
    pub reservation: ReservationDBResponse,
    pub user: UserDBResponse,
    pub table: TableDBResponse,
}
