//! Persistence primitives the booking engine is written against.
//!
//! A [`Backend`] hands out one [`Gateway`] per request. The gateway is a unit of work: every
//! call made through it sees the writes made before it, and nothing becomes visible to other
//! requests until [`Gateway::commit`]. Dropping a gateway without committing discards its writes.

use crate::db::{
    errors::Result,
    handlers::reservations::ReservationFilter,
    models::{
        reservations::{ReservationCreateDBRequest, ReservationDBResponse, ReservationDetailsDBResponse, ReservationUpdateDBRequest},
        tables::TableDBResponse,
        users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use crate::types::{ReservationId, TableId, UserId};
use chrono::{DateTime, Utc};

/// Unique constraint guarding one booking per table and start instant.
pub const RESERVATION_SLOT_CONSTRAINT: &str = "reservations_table_id_date_time_key";

/// Unique constraint on user emails.
pub const USER_EMAIL_CONSTRAINT: &str = "users_email_key";

#[async_trait::async_trait]
pub trait Gateway: Send + Sized {
    async fn find_table(&mut self, id: TableId) -> Result<Option<TableDBResponse>>;

    /// All tables ordered by id.
    async fn list_tables(&mut self) -> Result<Vec<TableDBResponse>>;

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>>;

    /// Plain insert; a taken email is a unique violation of [`USER_EMAIL_CONSTRAINT`].
    async fn create_user(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    /// Insert, or return the existing user with the same email unchanged.
    async fn upsert_user_by_email(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    async fn update_user(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse>;

    async fn find_reservation_by_table_and_time(&mut self, table_id: TableId, date_time: DateTime<Utc>) -> Result<Option<ReservationDBResponse>>;

    async fn find_reservation_by_id(&mut self, id: ReservationId) -> Result<Option<ReservationDetailsDBResponse>>;

    /// One page of reservations (ordered by `date_time`, then id) and the total matching count.
    async fn list_reservations(&mut self, filter: &ReservationFilter) -> Result<(Vec<ReservationDetailsDBResponse>, i64)>;

    /// A taken slot is a unique violation of [`RESERVATION_SLOT_CONSTRAINT`].
    async fn create_reservation(&mut self, request: &ReservationCreateDBRequest) -> Result<ReservationDBResponse>;

    async fn update_reservation(&mut self, id: ReservationId, request: &ReservationUpdateDBRequest) -> Result<ReservationDBResponse>;

    /// Returns whether a row was deleted.
    async fn delete_reservation(&mut self, id: ReservationId) -> Result<bool>;

    /// Make every write of this gateway visible.
    async fn commit(self) -> Result<()>;
}

/// A source of gateways, shared across requests through the application state.
#[async_trait::async_trait]
pub trait Backend: Clone + Send + Sync + 'static {
    type Gateway: Gateway;

    async fn begin(&self) -> Result<Self::Gateway>;
}
