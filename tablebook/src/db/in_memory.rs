//! In-memory backend for tests and local development.
//!
//! A gateway takes the store lock for its whole lifetime and works on a copy of the data;
//! [`Gateway::commit`] swaps the copy in. Transactions are therefore serialized, and a dropped
//! gateway leaves the store untouched. Unique and foreign key constraints of the PostgreSQL schema
//! are emulated so the engine sees the same [`DbError`] variants from both backends.

use crate::db::{
    errors::{DbError, Result},
    gateway::{Backend, Gateway, RESERVATION_SLOT_CONSTRAINT, USER_EMAIL_CONSTRAINT},
    handlers::reservations::ReservationFilter,
    models::{
        reservations::{ReservationCreateDBRequest, ReservationDBResponse, ReservationDetailsDBResponse, ReservationUpdateDBRequest},
        tables::{TableCreateDBRequest, TableDBResponse},
        users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use crate::types::{ReservationId, TableId, UserId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct Store {
    users: BTreeMap<UserId, UserDBResponse>,
    tables: BTreeMap<TableId, TableDBResponse>,
    reservations: BTreeMap<ReservationId, ReservationDBResponse>,
    last_user_id: UserId,
    last_table_id: TableId,
    last_reservation_id: ReservationId,
}

impl Store {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users.values().any(|u| u.email == email && Some(u.id) != except)
    }

    fn slot_taken(&self, table_id: TableId, date_time: DateTime<Utc>, except: Option<ReservationId>) -> bool {
        self.reservations
            .values()
            .any(|r| r.table_id == table_id && r.date_time == date_time && Some(r.id) != except)
    }

    fn details(&self, reservation: &ReservationDBResponse) -> Result<ReservationDetailsDBResponse> {
        let user = self
            .users
            .get(&reservation.user_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("reservation {} references missing user {}", reservation.id, reservation.user_id))?;
        let table = self
            .tables
            .get(&reservation.table_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("reservation {} references missing table {}", reservation.id, reservation.table_id))?;

        Ok(ReservationDetailsDBResponse {
            reservation: reservation.clone(),
            user,
            table,
        })
    }

    fn insert_user(&mut self, request: &UserCreateDBRequest) -> UserDBResponse {
        self.last_user_id += 1;
        let now = Utc::now();
        let user = UserDBResponse {
            id: self.last_user_id,
            name: request.name.clone(),
            email: request.email.clone(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        user
    }

    fn insert_table(&mut self, request: &TableCreateDBRequest) -> Result<TableDBResponse> {
        if request.seats < 1 {
            return Err(DbError::CheckViolation {
                constraint: Some("restaurant_tables_seats_check".to_string()),
                table: Some("restaurant_tables".to_string()),
                message: format!("seats must be at least 1, got {}", request.seats),
            });
        }
        self.last_table_id += 1;
        let table = TableDBResponse {
            id: self.last_table_id,
            seats: request.seats,
        };
        self.tables.insert(table.id, table.clone());
        Ok(table)
    }

    fn check_reservation_refs(&self, user_id: UserId, table_id: TableId) -> Result<()> {
        if !self.users.contains_key(&user_id) {
            return Err(foreign_key_violation("reservations_user_id_fkey", user_id));
        }
        if !self.tables.contains_key(&table_id) {
            return Err(foreign_key_violation("reservations_table_id_fkey", table_id));
        }
        Ok(())
    }
}

fn email_violation(email: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(USER_EMAIL_CONSTRAINT.to_string()),
        table: Some("users".to_string()),
        message: "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
        conflicting_value: Some(email.to_string()),
    }
}

fn slot_violation(table_id: TableId, date_time: DateTime<Utc>) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(RESERVATION_SLOT_CONSTRAINT.to_string()),
        table: Some("reservations".to_string()),
        message: format!("duplicate key value violates unique constraint \"{RESERVATION_SLOT_CONSTRAINT}\""),
        conflicting_value: Some(format!("{table_id}, {date_time}")),
    }
}

fn foreign_key_violation(constraint: &str, id: i32) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some("reservations".to_string()),
        message: format!("insert or update on table \"reservations\" violates foreign key constraint \"{constraint}\" (id {id})"),
    }
}

fn duration_check(duration: i32) -> Result<()> {
    if duration > 0 {
        Ok(())
    } else {
        Err(DbError::CheckViolation {
            constraint: Some("reservations_duration_check".to_string()),
            table: Some("reservations".to_string()),
            message: format!("duration must be positive, got {duration}"),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table outside of any request, as seeding does.
    pub async fn insert_table(&self, seats: i32) -> Result<TableDBResponse> {
        self.store.lock().await.insert_table(&TableCreateDBRequest { seats })
    }

    pub async fn table_count(&self) -> usize {
        self.store.lock().await.tables.len()
    }

    pub async fn user_count(&self) -> usize {
        self.store.lock().await.users.len()
    }

    pub async fn reservation_count(&self) -> usize {
        self.store.lock().await.reservations.len()
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    type Gateway = InMemoryGateway;

    async fn begin(&self) -> Result<InMemoryGateway> {
        let guard = self.store.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryGateway { guard, working })
    }
}

pub struct InMemoryGateway {
    guard: OwnedMutexGuard<Store>,
    working: Store,
}

#[async_trait::async_trait]
impl Gateway for InMemoryGateway {
    async fn find_table(&mut self, id: TableId) -> Result<Option<TableDBResponse>> {
        Ok(self.working.tables.get(&id).cloned())
    }

    async fn list_tables(&mut self) -> Result<Vec<TableDBResponse>> {
        Ok(self.working.tables.values().cloned().collect())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.working.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        if self.working.email_taken(&request.email, None) {
            return Err(email_violation(&request.email));
        }
        Ok(self.working.insert_user(request))
    }

    async fn upsert_user_by_email(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        if let Some(existing) = self.working.users.values().find(|u| u.email == request.email) {
            return Ok(existing.clone());
        }
        Ok(self.working.insert_user(request))
    }

    async fn update_user(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        if let Some(email) = &request.email
            && self.working.email_taken(email, Some(id))
        {
            return Err(email_violation(email));
        }

        let user = self.working.users.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(email) = &request.email {
            user.email = email.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn find_reservation_by_table_and_time(&mut self, table_id: TableId, date_time: DateTime<Utc>) -> Result<Option<ReservationDBResponse>> {
        Ok(self
            .working
            .reservations
            .values()
            .find(|r| r.table_id == table_id && r.date_time == date_time)
            .cloned())
    }

    async fn find_reservation_by_id(&mut self, id: ReservationId) -> Result<Option<ReservationDetailsDBResponse>> {
        self.working
            .reservations
            .get(&id)
            .map(|reservation| self.working.details(reservation))
            .transpose()
    }

    async fn list_reservations(&mut self, filter: &ReservationFilter) -> Result<(Vec<ReservationDetailsDBResponse>, i64)> {
        let mut matching: Vec<&ReservationDBResponse> = self
            .working
            .reservations
            .values()
            .filter(|r| filter.contains(r.date_time))
            .collect();
        matching.sort_by_key(|r| (r.date_time, r.id));

        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(usize::try_from(filter.skip).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(0))
            .map(|r| self.working.details(r))
            .collect::<Result<Vec<_>>>()?;

        Ok((rows, total))
    }

    async fn create_reservation(&mut self, request: &ReservationCreateDBRequest) -> Result<ReservationDBResponse> {
        self.working.check_reservation_refs(request.user_id, request.table_id)?;
        duration_check(request.duration)?;
        if self.working.slot_taken(request.table_id, request.date_time, None) {
            return Err(slot_violation(request.table_id, request.date_time));
        }

        self.working.last_reservation_id += 1;
        let now = Utc::now();
        let reservation = ReservationDBResponse {
            id: self.working.last_reservation_id,
            user_id: request.user_id,
            table_id: request.table_id,
            date_time: request.date_time,
            duration: request.duration,
            created_at: now,
            updated_at: now,
        };
        self.working.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn update_reservation(&mut self, id: ReservationId, request: &ReservationUpdateDBRequest) -> Result<ReservationDBResponse> {
        let user_id = self.working.reservations.get(&id).map(|r| r.user_id).ok_or(DbError::NotFound)?;
        self.working.check_reservation_refs(user_id, request.table_id)?;
        duration_check(request.duration)?;
        if self.working.slot_taken(request.table_id, request.date_time, Some(id)) {
            return Err(slot_violation(request.table_id, request.date_time));
        }

        let reservation = self.working.reservations.get_mut(&id).ok_or(DbError::NotFound)?;
        reservation.table_id = request.table_id;
        reservation.date_time = request.date_time;
        reservation.duration = request.duration;
        reservation.updated_at = Utc::now();
        Ok(reservation.clone())
    }

    async fn delete_reservation(&mut self, id: ReservationId) -> Result<bool> {
        Ok(self.working.reservations.remove(&id).is_some())
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alice() -> UserCreateDBRequest {
        UserCreateDBRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let backend = InMemoryBackend::new();

        {
            let mut gateway = backend.begin().await.unwrap();
            gateway.create_user(&alice()).await.unwrap();
        }
        assert_eq!(backend.user_count().await, 0);

        let mut gateway = backend.begin().await.unwrap();
        gateway.create_user(&alice()).await.unwrap();
        gateway.commit().await.unwrap();
        assert_eq!(backend.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let backend = InMemoryBackend::new();
        let mut gateway = backend.begin().await.unwrap();

        gateway.create_user(&alice()).await.unwrap();
        let err = gateway.create_user(&alice()).await.unwrap_err();
        assert!(err.is_unique_violation_of(USER_EMAIL_CONSTRAINT));

        let upserted = gateway.upsert_user_by_email(&alice()).await.unwrap();
        assert_eq!(upserted.id, 1);
    }

    #[tokio::test]
    async fn test_reservation_constraints() {
        let backend = InMemoryBackend::new();
        let table = backend.insert_table(4).await.unwrap();
        let mut gateway = backend.begin().await.unwrap();
        let user = gateway.create_user(&alice()).await.unwrap();
        let slot = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();

        let request = ReservationCreateDBRequest {
            user_id: user.id,
            table_id: table.id,
            date_time: slot,
            duration: 60,
        };
        gateway.create_reservation(&request).await.unwrap();

        let err = gateway.create_reservation(&request).await.unwrap_err();
        assert!(err.is_unique_violation_of(RESERVATION_SLOT_CONSTRAINT));

        let err = gateway
            .create_reservation(&ReservationCreateDBRequest {
                table_id: table.id + 1,
                ..request.clone()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let err = gateway
            .create_reservation(&ReservationCreateDBRequest { duration: 0, ..request })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_insert_table_rejects_zero_seats() {
        let backend = InMemoryBackend::new();
        assert!(matches!(backend.insert_table(0).await, Err(DbError::CheckViolation { .. })));
        assert_eq!(backend.table_count().await, 0);
    }
}
