//! Reservation rules engine.
//!
//! The [`Engine`] decides whether a booking is legal and performs it through a borrowed
//! [`Gateway`]. Every check runs before the first write, and callers commit the gateway only
//! after the engine returns `Ok`, so a rejected operation leaves nothing behind.
//!
//! # Rules
//!
//! - Start hour (UTC) inside the opening window, end hour before closing ([`hours`])
//! - One reservation per table and exact start instant (slot availability)
//! - The table must exist
//! - Users are found by email or created on first booking
//! - Edits merge a partial [`ReservationPatch`] over the stored reservation ([`patch`])
//!
//! Availability compares start instants only: two bookings of the same table starting 30
//! minutes apart do not conflict even if their durations overlap.

pub mod hours;
pub mod patch;

use crate::config::Config;
use crate::db::{
    Gateway,
    errors::DbError,
    gateway::RESERVATION_SLOT_CONSTRAINT,
    handlers::reservations::ReservationFilter,
    models::{
        reservations::{ReservationCreateDBRequest, ReservationDetailsDBResponse},
        tables::TableDBResponse,
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use crate::errors::{Error, Result};
use crate::types::{ReservationId, TableId, parse_timestamp};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, instrument};

pub use hours::{OpeningHours, OpeningHoursViolation};
pub use patch::{MergedReservation, ReservationPatch};

/// Policy values the engine applies to every booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRules {
    pub opening_hours: OpeningHours,
    /// Minutes stored when a reservation is created without a duration
    pub default_duration_minutes: i32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            opening_hours: OpeningHours::default(),
            default_duration_minutes: 60,
        }
    }
}

impl From<&Config> for BookingRules {
    fn from(config: &Config) -> Self {
        Self {
            opening_hours: config.opening_hours,
            default_duration_minutes: config.default_duration_minutes,
        }
    }
}

/// A booking request as accepted by [`Engine::create_reservation`].
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub username: String,
    pub user_email: String,
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
    /// Minutes; the rules' default is stored when absent
    pub duration: Option<i32>,
}

/// A reservation made together with a new user.
#[derive(Debug, Clone)]
pub struct InitialReservation {
    pub table_id: TableId,
    pub date_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub reservation: Option<InitialReservation>,
}

/// Page selection and date range for [`Engine::list_reservations`].
///
/// Bounds are kept as the raw client strings and parsed by the engine.
#[derive(Debug, Clone)]
pub struct ReservationQuery {
    /// 1-based
    pub page: i64,
    pub limit: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReservationPage {
    pub reservations: Vec<ReservationDetailsDBResponse>,
    /// Reservations matching the date range across all pages
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl ReservationPage {
    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }
}

/// Map a slot unique violation raised by the write itself to the same conflict the pre-check
/// reports. Another request may have booked the slot since the check.
fn slot_conflict(err: DbError) -> Error {
    if err.is_unique_violation_of(RESERVATION_SLOT_CONSTRAINT) {
        Error::slot_taken()
    } else {
        Error::Database(err)
    }
}

fn parse_date_bound(field: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).ok_or_else(|| Error::bad_request(format!("{field} must be a valid ISO 8601 date")))
}

/// Upper bound of a listing. A bare calendar date covers that whole day.
fn parse_end_bound(value: &str) -> Result<DateTime<Utc>> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| Error::bad_request("endDate must be a valid ISO 8601 date")),
        Err(_) => parse_date_bound("endDate", value),
    }
}

pub struct Engine<'g, G> {
    gateway: &'g mut G,
    rules: &'g BookingRules,
}

impl<'g, G: Gateway> Engine<'g, G> {
    pub fn new(gateway: &'g mut G, rules: &'g BookingRules) -> Self {
        Self { gateway, rules }
    }

    /// Reject if the table already has a reservation starting at exactly `date_time`.
    ///
    /// `ignore` excludes one reservation from the check (the one being edited).
    #[instrument(skip(self), err)]
    pub async fn check_availability(&mut self, table_id: TableId, date_time: DateTime<Utc>, ignore: Option<ReservationId>) -> Result<()> {
        match self.gateway.find_reservation_by_table_and_time(table_id, date_time).await? {
            Some(existing) if Some(existing.id) != ignore => {
                debug!(reservation_id = existing.id, "Slot already taken");
                Err(Error::slot_taken())
            }
            _ => Ok(()),
        }
    }

    #[instrument(skip(self), err)]
    pub async fn resolve_table(&mut self, table_id: TableId) -> Result<TableDBResponse> {
        self.gateway
            .find_table(table_id)
            .await?
            .ok_or_else(|| Error::not_found("Table", table_id))
    }

    /// Return the user with this email, creating it if absent. An existing user keeps its name.
    #[instrument(skip(self, name), err)]
    pub async fn resolve_or_create_user(&mut self, email: &str, name: &str) -> Result<UserDBResponse> {
        if let Some(user) = self.gateway.find_user_by_email(email).await? {
            return Ok(user);
        }

        let user = self
            .gateway
            .upsert_user_by_email(&UserCreateDBRequest {
                name: name.to_string(),
                email: email.to_string(),
            })
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, request), fields(table_id = request.table_id, date_time = %request.date_time), err)]
    pub async fn create_reservation(&mut self, request: NewReservation) -> Result<ReservationDetailsDBResponse> {
        let duration = request.duration.unwrap_or(self.rules.default_duration_minutes);
        self.rules.opening_hours.validate(&request.date_time, Some(duration))?;
        self.check_availability(request.table_id, request.date_time, None).await?;
        let table = self.resolve_table(request.table_id).await?;
        let user = self.resolve_or_create_user(&request.user_email, &request.username).await?;

        let reservation = self
            .gateway
            .create_reservation(&ReservationCreateDBRequest {
                user_id: user.id,
                table_id: table.id,
                date_time: request.date_time,
                duration,
            })
            .await
            .map_err(slot_conflict)?;

        Ok(ReservationDetailsDBResponse { reservation, user, table })
    }

    #[instrument(skip(self), err)]
    pub async fn get_reservation(&mut self, id: ReservationId) -> Result<ReservationDetailsDBResponse> {
        self.gateway
            .find_reservation_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Reservation", id))
    }

    /// Apply a partial update.
    ///
    /// Opening hours are re-checked only when a time or duration is supplied, availability only
    /// when the effective slot moves, and the table only when it changes. User fields update the
    /// owning user in place.
    #[instrument(skip(self, patch), err)]
    pub async fn edit_reservation(&mut self, id: ReservationId, patch: ReservationPatch) -> Result<ReservationDetailsDBResponse> {
        let existing = self.get_reservation(id).await?;
        let merged = patch.merge(&existing.reservation);

        if merged.reschedules {
            self.rules
                .opening_hours
                .validate(&merged.reservation.date_time, Some(merged.reservation.duration))?;
        }

        if merged.moves_slot {
            self.check_availability(merged.reservation.table_id, merged.reservation.date_time, Some(id))
                .await?;
        }

        let table = if merged.changes_table {
            self.resolve_table(merged.reservation.table_id).await?
        } else {
            existing.table
        };

        let user = if merged.user.is_empty() {
            existing.user
        } else {
            self.gateway.update_user(existing.user.id, &merged.user).await?
        };

        let reservation = self
            .gateway
            .update_reservation(id, &merged.reservation)
            .await
            .map_err(slot_conflict)?;

        Ok(ReservationDetailsDBResponse { reservation, user, table })
    }

    #[instrument(skip(self), err)]
    pub async fn delete_reservation(&mut self, id: ReservationId) -> Result<()> {
        if self.gateway.delete_reservation(id).await? {
            Ok(())
        } else {
            Err(Error::not_found("Reservation", id))
        }
    }

    /// One page of reservations with their users and tables.
    ///
    /// Both date bounds are parsed before any query runs; an unparseable bound is a validation
    /// error.
    #[instrument(skip(self), err)]
    pub async fn list_reservations(&mut self, query: ReservationQuery) -> Result<ReservationPage> {
        let start = query
            .start_date
            .as_deref()
            .map(|value| parse_date_bound("startDate", value))
            .transpose()?;
        let end = query
            .end_date
            .as_deref()
            .map(parse_end_bound)
            .transpose()?;

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let skip = (page - 1).saturating_mul(limit);

        let filter = ReservationFilter::new(skip, limit).with_range(start, end);
        let (reservations, total) = self.gateway.list_reservations(&filter).await?;

        Ok(ReservationPage {
            reservations,
            total,
            page,
            limit,
        })
    }

    /// Create a user, optionally with a first reservation.
    ///
    /// The reservation is checked like [`Engine::create_reservation`] before the user is
    /// written. A taken email is rejected rather than resolved.
    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create_user(&mut self, request: NewUser) -> Result<UserDBResponse> {
        let table = match &request.reservation {
            Some(initial) => {
                self.rules
                    .opening_hours
                    .validate(&initial.date_time, Some(self.rules.default_duration_minutes))?;
                self.check_availability(initial.table_id, initial.date_time, None).await?;
                Some(self.resolve_table(initial.table_id).await?)
            }
            None => None,
        };

        let user = self
            .gateway
            .create_user(&UserCreateDBRequest {
                name: request.name,
                email: request.email,
            })
            .await?;

        if let (Some(initial), Some(table)) = (request.reservation, table) {
            self.gateway
                .create_reservation(&ReservationCreateDBRequest {
                    user_id: user.id,
                    table_id: table.id,
                    date_time: initial.date_time,
                    duration: self.rules.default_duration_minutes,
                })
                .await
                .map_err(slot_conflict)?;
        }

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn list_tables(&mut self) -> Result<Vec<TableDBResponse>> {
        Ok(self.gateway.list_tables().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        Backend, InMemoryBackend,
        in_memory::InMemoryGateway,
        models::{
            reservations::{ReservationDBResponse, ReservationUpdateDBRequest},
            users::UserUpdateDBRequest,
        },
    };
    use crate::types::UserId;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn alice_at(table_id: TableId, date_time: DateTime<Utc>) -> NewReservation {
        NewReservation {
            username: "Alice".to_string(),
            user_email: "alice@example.com".to_string(),
            table_id,
            date_time,
            duration: Some(60),
        }
    }

    async fn backend_with_table() -> (InMemoryBackend, TableDBResponse) {
        let backend = InMemoryBackend::new();
        let table = backend.insert_table(4).await.unwrap();
        (backend, table)
    }

    /// Run one engine operation in its own committed transaction.
    async fn commit<T>(backend: &InMemoryBackend, rules: &BookingRules, op: impl AsyncFnOnce(&mut Engine<'_, InMemoryGateway>) -> Result<T>) -> Result<T> {
        let mut gateway = backend.begin().await?;
        let result = op(&mut Engine::new(&mut gateway, rules)).await?;
        gateway.commit().await?;
        Ok(result)
    }

    #[tokio::test]
    async fn test_create_reservation_creates_user_and_derives_end_time() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        let created = commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(1, 20))).await)
            .await
            .unwrap();

        assert_eq!(created.user.name, "Alice");
        assert_eq!(created.table, table);
        assert_eq!(created.reservation.end_time(), at(1, 21));
        assert_eq!(backend.user_count().await, 1);
        assert_eq!(backend.reservation_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_duration_stores_default() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        let request = NewReservation {
            duration: None,
            ..alice_at(table.id, at(1, 22))
        };
        let created = commit(&backend, &rules, async |engine| engine.create_reservation(request).await)
            .await
            .unwrap();

        assert_eq!(created.reservation.duration, 60);
        assert_eq!(created.reservation.end_time(), at(1, 23));
    }

    #[tokio::test]
    async fn test_missing_duration_is_checked_against_closing() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        // the default 60 minutes would end at 24:00
        let request = NewReservation {
            duration: None,
            ..alice_at(table.id, at(1, 23))
        };
        let err = commit(&backend, &rules, async |engine| engine.create_reservation(request).await)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Reservation must end before the restaurant closes at 24:00.");
        assert_eq!(backend.reservation_count().await, 0);
        assert_eq!(backend.user_count().await, 0);
    }

    /// A gateway whose slot pre-check always finds the slot free while every reservation write
    /// fails on the slot unique constraint, as when a concurrent request commits in between.
    struct LostRaceGateway {
        existing: ReservationDetailsDBResponse,
    }

    impl LostRaceGateway {
        fn new() -> Self {
            let created = at(1, 12);
            let user = UserDBResponse {
                id: 1,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                created_at: created,
                updated_at: created,
            };
            let table = TableDBResponse { id: 1, seats: 4 };
            let reservation = ReservationDBResponse {
                id: 1,
                user_id: user.id,
                table_id: table.id,
                date_time: at(1, 20),
                duration: 60,
                created_at: created,
                updated_at: created,
            };
            Self {
                existing: ReservationDetailsDBResponse { reservation, user, table },
            }
        }

        fn slot_violation() -> DbError {
            DbError::UniqueViolation {
                constraint: Some(RESERVATION_SLOT_CONSTRAINT.to_string()),
                table: Some("reservations".to_string()),
                message: format!("duplicate key value violates unique constraint \"{RESERVATION_SLOT_CONSTRAINT}\""),
                conflicting_value: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl Gateway for LostRaceGateway {
        async fn find_table(&mut self, id: TableId) -> crate::db::errors::Result<Option<TableDBResponse>> {
            Ok(Some(TableDBResponse { id, seats: 4 }))
        }

        async fn list_tables(&mut self) -> crate::db::errors::Result<Vec<TableDBResponse>> {
            Ok(vec![self.existing.table.clone()])
        }

        async fn find_user_by_email(&mut self, _email: &str) -> crate::db::errors::Result<Option<UserDBResponse>> {
            Ok(Some(self.existing.user.clone()))
        }

        async fn create_user(&mut self, _request: &UserCreateDBRequest) -> crate::db::errors::Result<UserDBResponse> {
            Ok(self.existing.user.clone())
        }

        async fn upsert_user_by_email(&mut self, _request: &UserCreateDBRequest) -> crate::db::errors::Result<UserDBResponse> {
            Ok(self.existing.user.clone())
        }

        async fn update_user(&mut self, _id: UserId, _request: &UserUpdateDBRequest) -> crate::db::errors::Result<UserDBResponse> {
            Ok(self.existing.user.clone())
        }

        async fn find_reservation_by_table_and_time(
            &mut self,
            _table_id: TableId,
            _date_time: DateTime<Utc>,
        ) -> crate::db::errors::Result<Option<ReservationDBResponse>> {
            Ok(None)
        }

        async fn find_reservation_by_id(&mut self, _id: ReservationId) -> crate::db::errors::Result<Option<ReservationDetailsDBResponse>> {
            Ok(Some(self.existing.clone()))
        }

        async fn list_reservations(
            &mut self,
            _filter: &ReservationFilter,
        ) -> crate::db::errors::Result<(Vec<ReservationDetailsDBResponse>, i64)> {
            Ok((vec![self.existing.clone()], 1))
        }

        async fn create_reservation(&mut self, _request: &ReservationCreateDBRequest) -> crate::db::errors::Result<ReservationDBResponse> {
            Err(Self::slot_violation())
        }

        async fn update_reservation(
            &mut self,
            _id: ReservationId,
            _request: &ReservationUpdateDBRequest,
        ) -> crate::db::errors::Result<ReservationDBResponse> {
            Err(Self::slot_violation())
        }

        async fn delete_reservation(&mut self, _id: ReservationId) -> crate::db::errors::Result<bool> {
            Ok(true)
        }

        async fn commit(self) -> crate::db::errors::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slot_constraint_on_create_is_reported_as_conflict() {
        let rules = BookingRules::default();
        let mut gateway = LostRaceGateway::new();

        let err = Engine::new(&mut gateway, &rules)
            .create_reservation(alice_at(1, at(1, 21)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(err.user_message(), crate::errors::SLOT_TAKEN_MESSAGE);
    }

    #[tokio::test]
    async fn test_slot_constraint_on_edit_is_reported_as_conflict() {
        let rules = BookingRules::default();
        let mut gateway = LostRaceGateway::new();

        let patch = ReservationPatch {
            date_time: Some(at(1, 21)),
            ..ReservationPatch::default()
        };
        let err = Engine::new(&mut gateway, &rules).edit_reservation(1, patch).await.unwrap_err();

        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(err.user_message(), crate::errors::SLOT_TAKEN_MESSAGE);
    }

    #[tokio::test]
    async fn test_slot_constraint_on_initial_reservation_is_reported_as_conflict() {
        let rules = BookingRules::default();
        let mut gateway = LostRaceGateway::new();

        let request = NewUser {
            name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
            reservation: Some(InitialReservation {
                table_id: 1,
                date_time: at(1, 21),
            }),
        };
        let err = Engine::new(&mut gateway, &rules).create_user(request).await.unwrap_err();

        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_resolve_or_create_user_is_idempotent() {
        let backend = InMemoryBackend::new();
        let rules = BookingRules::default();

        let first = commit(&backend, &rules, async |engine| {
            engine.resolve_or_create_user("alice@example.com", "Alice").await
        })
        .await
        .unwrap();
        let second = commit(&backend, &rules, async |engine| {
            engine.resolve_or_create_user("alice@example.com", "Not Alice").await
        })
        .await
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.name, "Alice");
        assert_eq!(backend.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_slot_is_conflict_without_new_rows() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(1, 20))).await)
            .await
            .unwrap();

        let request = NewReservation {
            username: "Bob".to_string(),
            user_email: "bob@example.com".to_string(),
            ..alice_at(table.id, at(1, 20))
        };
        let err = commit(&backend, &rules, async |engine| engine.create_reservation(request).await)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(err.user_message(), "Table is already reserved for the selected time slot.");
        assert_eq!(backend.reservation_count().await, 1);
        // Bob was never created
        assert_eq!(backend.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_opening_hours_are_checked_before_anything_else() {
        let backend = InMemoryBackend::new();
        let rules = BookingRules::default();

        // No table 1 exists, but the hour is rejected first
        let err = commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(1, at(1, 18))).await)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Reservations are only available between 19:00 and 24:00.");

        let request = NewReservation {
            duration: Some(120),
            ..alice_at(1, at(1, 22))
        };
        let err = commit(&backend, &rules, async |engine| engine.create_reservation(request).await)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Reservation must end before the restaurant closes at 24:00.");
        assert_eq!(backend.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let backend = InMemoryBackend::new();
        let rules = BookingRules::default();

        let err = commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(42, at(1, 20))).await)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.user_message(), "Table with ID 42 not found");
        assert_eq!(backend.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_username_only_edit_skips_hours_and_availability() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        // Stored directly, bypassing the rules: 18:00 is outside opening hours
        let mut gateway = backend.begin().await.unwrap();
        let user = gateway
            .create_user(&UserCreateDBRequest {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await
            .unwrap();
        let stored = gateway
            .create_reservation(&ReservationCreateDBRequest {
                user_id: user.id,
                table_id: table.id,
                date_time: at(1, 18),
                duration: 60,
            })
            .await
            .unwrap();
        gateway.commit().await.unwrap();

        let patch = ReservationPatch {
            username: Some("Alicia".to_string()),
            ..Default::default()
        };
        let edited = commit(&backend, &rules, async |engine| engine.edit_reservation(stored.id, patch).await)
            .await
            .unwrap();

        assert_eq!(edited.user.name, "Alicia");
        assert_eq!(edited.user.id, user.id);
        assert_eq!(edited.reservation.date_time, at(1, 18));
        assert_eq!(backend.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_edit_to_same_slot_does_not_conflict_with_itself() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        let created = commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(1, 20))).await)
            .await
            .unwrap();

        let patch = ReservationPatch {
            table_id: Some(table.id),
            date_time: Some(at(1, 20)),
            duration: Some(90),
            ..Default::default()
        };
        let edited = commit(&backend, &rules, async |engine| engine.edit_reservation(created.reservation.id, patch).await)
            .await
            .unwrap();

        assert_eq!(edited.reservation.duration, 90);
    }

    #[tokio::test]
    async fn test_edit_into_taken_slot_or_closed_hours_is_rejected() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(1, 20))).await)
            .await
            .unwrap();
        let second = commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(1, 21))).await)
            .await
            .unwrap();

        let patch = ReservationPatch {
            date_time: Some(at(1, 20)),
            ..Default::default()
        };
        let err = commit(&backend, &rules, async |engine| engine.edit_reservation(second.reservation.id, patch).await)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        let patch = ReservationPatch {
            duration: Some(180),
            ..Default::default()
        };
        let err = commit(&backend, &rules, async |engine| engine.edit_reservation(second.reservation.id, patch).await)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Reservation must end before the restaurant closes at 24:00.");
    }

    #[tokio::test]
    async fn test_edit_to_unknown_table_is_not_found() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        let created = commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(1, 20))).await)
            .await
            .unwrap();

        let patch = ReservationPatch {
            table_id: Some(99),
            username: Some("Renamed".to_string()),
            ..Default::default()
        };
        let err = commit(&backend, &rules, async |engine| engine.edit_reservation(created.reservation.id, patch).await)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Table with ID 99 not found");

        // The failed edit did not rename the user
        let reloaded = commit(&backend, &rules, async |engine| engine.get_reservation(created.reservation.id).await)
            .await
            .unwrap();
        assert_eq!(reloaded.user.name, "Alice");
    }

    #[tokio::test]
    async fn test_edit_and_delete_missing_reservation() {
        let backend = InMemoryBackend::new();
        let rules = BookingRules::default();

        let err = commit(&backend, &rules, async |engine| engine.edit_reservation(5, ReservationPatch::default()).await)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Reservation with ID 5 not found");

        let err = commit(&backend, &rules, async |engine| engine.delete_reservation(5).await)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_pagination_over_25_reservations() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        for day in 1..=25 {
            commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(day, 20))).await)
                .await
                .unwrap();
        }

        let query = ReservationQuery {
            page: 3,
            limit: 10,
            start_date: None,
            end_date: None,
        };
        let page = commit(&backend, &rules, async |engine| engine.list_reservations(query).await)
            .await
            .unwrap();

        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.reservations.len(), 5);
        let days: Vec<DateTime<Utc>> = page.reservations.iter().map(|r| r.reservation.date_time).collect();
        assert_eq!(days, (21..=25).map(|day| at(day, 20)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_list_filters_by_inclusive_date_range() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        for day in 1..=5 {
            commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(day, 20))).await)
                .await
                .unwrap();
        }

        let query = ReservationQuery {
            page: 1,
            limit: 10,
            start_date: Some("2024-01-02T20:00:00Z".to_string()),
            end_date: Some("2024-01-04T20:00:00Z".to_string()),
        };
        let page = commit(&backend, &rules, async |engine| engine.list_reservations(query).await)
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.reservations[0].reservation.date_time, at(2, 20));
        assert_eq!(page.reservations[2].reservation.date_time, at(4, 20));
    }

    #[tokio::test]
    async fn test_date_only_end_bound_covers_the_whole_day() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        for day in 1..=5 {
            commit(&backend, &rules, async |engine| engine.create_reservation(alice_at(table.id, at(day, 20))).await)
                .await
                .unwrap();
        }

        let query = ReservationQuery {
            page: 1,
            limit: 10,
            start_date: Some("2024-01-02".to_string()),
            end_date: Some("2024-01-04".to_string()),
        };
        let page = commit(&backend, &rules, async |engine| engine.list_reservations(query).await)
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        let days: Vec<DateTime<Utc>> = page.reservations.iter().map(|r| r.reservation.date_time).collect();
        assert_eq!(days, vec![at(2, 20), at(3, 20), at(4, 20)]);
    }

    #[tokio::test]
    async fn test_invalid_end_bound_is_rejected() {
        let backend = InMemoryBackend::new();
        let rules = BookingRules::default();

        let query = ReservationQuery {
            page: 1,
            limit: 10,
            start_date: None,
            end_date: Some("2024-13-45".to_string()),
        };
        let err = commit(&backend, &rules, async |engine| engine.list_reservations(query).await)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "endDate must be a valid ISO 8601 date");
    }

    #[tokio::test]
    async fn test_invalid_date_bound_is_rejected() {
        let backend = InMemoryBackend::new();
        let rules = BookingRules::default();

        let query = ReservationQuery {
            page: 1,
            limit: 10,
            start_date: Some("not-a-date".to_string()),
            end_date: None,
        };
        let err = commit(&backend, &rules, async |engine| engine.list_reservations(query).await)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BadRequest { .. }));
        assert_eq!(err.user_message(), "startDate must be a valid ISO 8601 date");
    }

    #[tokio::test]
    async fn test_create_user_with_initial_reservation() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        let request = NewUser {
            name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
            reservation: Some(InitialReservation {
                table_id: table.id,
                date_time: at(1, 19),
            }),
        };
        let user = commit(&backend, &rules, async |engine| engine.create_user(request).await)
            .await
            .unwrap();

        assert_eq!(user.name, "Carol");
        assert_eq!(backend.reservation_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_user_rejects_bad_initial_reservation_before_writing() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        let request = NewUser {
            name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
            reservation: Some(InitialReservation {
                table_id: table.id,
                date_time: at(1, 12),
            }),
        };
        let err = commit(&backend, &rules, async |engine| engine.create_user(request).await)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BadRequest { .. }));
        assert_eq!(backend.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_user_initial_reservation_must_end_before_closing() {
        let (backend, table) = backend_with_table().await;
        let rules = BookingRules::default();

        let request = NewUser {
            name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
            reservation: Some(InitialReservation {
                table_id: table.id,
                date_time: at(1, 23),
            }),
        };
        let err = commit(&backend, &rules, async |engine| engine.create_user(request).await)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Reservation must end before the restaurant closes at 24:00.");
        assert_eq!(backend.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_user_with_taken_email_is_rejected() {
        let backend = InMemoryBackend::new();
        let rules = BookingRules::default();

        let request = NewUser {
            name: "Dan".to_string(),
            email: "dan@example.com".to_string(),
            reservation: None,
        };
        commit(&backend, &rules, async |engine| engine.create_user(request.clone()).await)
            .await
            .unwrap();
        let err = commit(&backend, &rules, async |engine| engine.create_user(request).await)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "A user with this email address already exists");
        assert_eq!(backend.user_count().await, 1);
    }
}
