//! Partial updates of reservations.

use crate::db::models::{
    reservations::{ReservationDBResponse, ReservationUpdateDBRequest},
    users::UserUpdateDBRequest,
};
use crate::types::TableId;
use chrono::{DateTime, Utc};

/// Fields a client may change on an existing reservation. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationPatch {
    pub username: Option<String>,
    pub user_email: Option<String>,
    pub table_id: Option<TableId>,
    pub date_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
}

/// The effective values after applying a [`ReservationPatch`], plus what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedReservation {
    pub reservation: ReservationUpdateDBRequest,
    pub user: UserUpdateDBRequest,
    /// A new time or duration was supplied, so opening hours must be checked again
    pub reschedules: bool,
    /// The effective table or start time differs from the stored one
    pub moves_slot: bool,
    /// The effective table differs from the stored one
    pub changes_table: bool,
}

impl ReservationPatch {
    pub fn merge(&self, existing: &ReservationDBResponse) -> MergedReservation {
        let table_id = self.table_id.unwrap_or(existing.table_id);
        let date_time = self.date_time.unwrap_or(existing.date_time);
        let duration = self.duration.unwrap_or(existing.duration);

        let changes_table = table_id != existing.table_id;

        MergedReservation {
            reservation: ReservationUpdateDBRequest {
                table_id,
                date_time,
                duration,
            },
            user: UserUpdateDBRequest {
                name: self.username.clone(),
                email: self.user_email.clone(),
            },
            reschedules: self.date_time.is_some() || self.duration.is_some(),
            moves_slot: changes_table || date_time != existing.date_time,
            changes_table,
        }
    }
}
